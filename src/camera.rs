// camera.rs — orbit camera fixed at the sphere center, plus billboard math

use glam::{Mat4, Vec3};

use crate::spherical::spherical_to_cartesian;

pub const DEFAULT_FOV_DEG: f32 = 75.0;
pub const MIN_FOV_DEG: f32 = 30.0;
pub const MAX_FOV_DEG: f32 = 100.0;

/// Elevation limit. Keeps the polar angle inside [45°, 135°] so the view can
/// never flip past a pole.
pub const PITCH_LIMIT_DEG: f32 = 45.0;

/// Yaw advance per second at `auto_rotate_speed == 1`.
const AUTO_ROTATE_DEG_PER_SEC: f32 = 6.0;

/// FOV change per wheel/pinch step, degrees.
const ZOOM_DEG_PER_STEP: f32 = 2.5;

/// The camera never translates; it only rotates about the origin, simulating
/// looking around from a fixed point.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV_DEG,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Unit vector the camera is looking along.
    pub fn look_dir(&self) -> Vec3 {
        spherical_to_cartesian(self.pitch, self.yaw, 1.0)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(Vec3::ZERO, self.look_dir(), Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov.to_radians(), aspect.max(1e-4), 0.1, 1500.0);
        proj * view
    }

    pub fn rotate(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw = (self.yaw + dyaw).rem_euclid(360.0);
        self.pitch = (self.pitch + dpitch).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
    }

    /// Rotate by a screen-space drag delta in pixels. The per-pixel angular
    /// step is derived from the current FOV and viewport so a drag across the
    /// whole window sweeps roughly one field of view at any zoom level.
    pub fn rotate_by_drag(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let v_fov = self.fov.to_radians();
        let aspect = width / height;
        let h_fov = 2.0 * ((v_fov / 2.0).tan() * aspect).atan();

        let yaw_per_px = (h_fov / width).to_degrees();
        let pitch_per_px = (v_fov / height).to_degrees();

        self.rotate(-dx * yaw_per_px, -dy * pitch_per_px);
    }

    /// Positive steps zoom in (narrower FOV).
    pub fn zoom(&mut self, steps: f32) {
        self.fov = (self.fov - steps * ZOOM_DEG_PER_STEP).clamp(MIN_FOV_DEG, MAX_FOV_DEG);
    }

    pub fn advance_auto_rotate(&mut self, speed: f32, dt: f32) {
        self.rotate(AUTO_ROTATE_DEG_PER_SEC * speed * dt, 0.0);
    }
}

/// Orthonormal (right, up) basis for a quad at `center` whose normal points
/// back at the origin, i.e. at the camera. Pure; the render loop only uses
/// the result to rebuild marker vertices.
pub fn billboard_basis(center: Vec3) -> (Vec3, Vec3) {
    let facing = match (-center).try_normalize() {
        Some(f) => f,
        None => return (Vec3::X, Vec3::Y),
    };

    let mut right = Vec3::Y.cross(facing);
    if right.length_squared() < 1e-6 {
        // Marker at a pole: the world up is parallel to the facing vector.
        right = Vec3::Z.cross(facing);
    }
    let right = right.normalize();
    let up = facing.cross(right).normalize();
    (right, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_along_x() {
        let cam = OrbitCamera::new();
        assert!(cam.look_dir().abs_diff_eq(Vec3::X, 1e-4));
        assert_eq!(cam.fov, DEFAULT_FOV_DEG);
    }

    #[test]
    fn pitch_never_escapes_clamp() {
        let mut cam = OrbitCamera::new();
        // A hostile drag sequence: huge sweeps in alternating directions.
        for (dx, dy) in [
            (0.0, 1e5),
            (300.0, -3e5),
            (-50.0, 2e4),
            (0.0, -1e6),
            (1e4, 1e6),
        ] {
            cam.rotate_by_drag(dx, dy, 1280.0, 720.0);
            assert!(cam.pitch >= -PITCH_LIMIT_DEG && cam.pitch <= PITCH_LIMIT_DEG);
        }
    }

    #[test]
    fn yaw_wraps_into_range() {
        let mut cam = OrbitCamera::new();
        cam.rotate(725.0, 0.0);
        assert!((cam.yaw - 5.0).abs() < 1e-3);
        cam.rotate(-10.0, 0.0);
        assert!((cam.yaw - 355.0).abs() < 1e-3);
    }

    #[test]
    fn zoom_respects_bounds() {
        let mut cam = OrbitCamera::new();
        cam.zoom(1000.0);
        assert_eq!(cam.fov, MIN_FOV_DEG);
        cam.zoom(-1000.0);
        assert_eq!(cam.fov, MAX_FOV_DEG);
    }

    #[test]
    fn auto_rotate_advances_yaw_monotonically() {
        let mut cam = OrbitCamera::new();
        let mut last = cam.yaw;
        for _ in 0..10 {
            cam.advance_auto_rotate(1.0, 0.5);
            assert!(cam.yaw > last);
            last = cam.yaw;
        }
        assert!((cam.yaw - 30.0).abs() < 1e-3); // 6°/s × 5 s
    }

    #[test]
    fn drag_scale_tracks_fov() {
        // Zoomed in, the same pixel drag must rotate less.
        let mut wide = OrbitCamera::new();
        let mut tight = OrbitCamera::new();
        tight.fov = MIN_FOV_DEG;

        wide.rotate_by_drag(100.0, 0.0, 1280.0, 720.0);
        tight.rotate_by_drag(100.0, 0.0, 1280.0, 720.0);

        let wide_swept = (360.0 - wide.yaw).min(wide.yaw);
        let tight_swept = (360.0 - tight.yaw).min(tight.yaw);
        assert!(tight_swept < wide_swept);
    }

    #[test]
    fn billboard_faces_origin() {
        for center in [
            Vec3::new(490.0, 0.0, 0.0),
            Vec3::new(0.0, 100.0, 300.0),
            Vec3::new(-20.0, 5.0, -1.0),
        ] {
            let (right, up) = billboard_basis(center);
            let normal = right.cross(up);
            let toward_camera = (-center).normalize();

            assert!((right.length() - 1.0).abs() < 1e-4);
            assert!((up.length() - 1.0).abs() < 1e-4);
            assert!(right.dot(up).abs() < 1e-4);
            assert!(
                normal.abs_diff_eq(toward_camera, 1e-4),
                "normal {normal} vs {toward_camera}"
            );
        }
    }

    #[test]
    fn billboard_survives_poles() {
        let (right, up) = billboard_basis(Vec3::new(0.0, 490.0, 0.0));
        assert!((right.cross(up) + Vec3::Y).length() < 1e-4);

        // Degenerate center: any orthonormal pair will do, but it must not panic.
        let (r0, u0) = billboard_basis(Vec3::ZERO);
        assert!(r0.dot(u0).abs() < 1e-4);
    }
}
