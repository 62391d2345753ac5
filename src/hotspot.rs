// hotspot.rs — interactive label markers on the panorama sphere

use glam::{Mat4, Vec3};

use crate::camera::billboard_basis;
use crate::config::HotspotAnnotation;
use crate::spherical::spherical_to_cartesian;

/// Markers sit at 0.98× the surface radius (490 for the 500 sphere), just
/// inside the panorama so the backdrop can never occlude them. Enforced
/// here, not in the mapper.
pub const MARKER_RADIUS_RATIO: f32 = 0.98;

pub const DEFAULT_MARKER_COLOR: [f32; 3] = [0.95, 0.45, 0.15];

/// Half-extent of the marker quad in world units.
const MARKER_WORLD_SIZE: f32 = 10.0;
const HOVERED_SCALE: f32 = 1.4;

/// Cursor-to-marker screen distance that counts as a hit, physical pixels.
pub const PICK_RADIUS_PX: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Idle,
    Hovered,
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub annotation: HotspotAnnotation,
    pub position: Vec3,
    pub color: [f32; 3],
    pub state: MarkerState,
}

impl Marker {
    pub fn new(annotation: HotspotAnnotation, surface_radius: f32) -> Self {
        let position = spherical_to_cartesian(
            annotation.pitch,
            annotation.yaw,
            surface_radius * MARKER_RADIUS_RATIO,
        );
        let color = match annotation.color.as_deref() {
            None => DEFAULT_MARKER_COLOR,
            Some(s) => parse_color(s).unwrap_or_else(|| {
                log::warn!("unrecognized hotspot color {s:?}, using default");
                DEFAULT_MARKER_COLOR
            }),
        };
        Self {
            annotation,
            position,
            color,
            state: MarkerState::Idle,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.state == MarkerState::Hovered
    }

    /// World-space quad corners, billboarded at the camera, counterclockwise
    /// from bottom-left. Hovered markers render slightly enlarged.
    pub fn quad_corners(&self) -> [Vec3; 4] {
        let (right, up) = billboard_basis(self.position);
        let s = MARKER_WORLD_SIZE * if self.is_hovered() { HOVERED_SCALE } else { 1.0 };
        let (r, u) = (right * s, up * s);
        [
            self.position - r - u,
            self.position + r - u,
            self.position + r + u,
            self.position - r + u,
        ]
    }

    /// Marker center in window pixels, `None` while behind the camera.
    pub fn project(&self, view_proj: &Mat4, width: f32, height: f32) -> Option<[f32; 2]> {
        let clip = *view_proj * self.position.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some([(ndc_x * 0.5 + 0.5) * width, (0.5 - ndc_y * 0.5) * height])
    }
}

/// Index of the marker under the cursor: nearest projected center within
/// [`PICK_RADIUS_PX`], front-facing markers only.
pub fn hovered_index(
    markers: &[Marker],
    cursor: [f32; 2],
    view_proj: &Mat4,
    width: f32,
    height: f32,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, m) in markers.iter().enumerate() {
        let Some([sx, sy]) = m.project(view_proj, width, height) else {
            continue;
        };
        let d = ((sx - cursor[0]).powi(2) + (sy - cursor[1]).powi(2)).sqrt();
        if d <= PICK_RADIUS_PX && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Parse a `#rrggbb` color into linear-ish RGB floats.
pub fn parse_color(s: &str) -> Option<[f32; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use crate::mesh::SPHERE_RADIUS;

    fn annotation(pitch: f32, yaw: f32) -> HotspotAnnotation {
        HotspotAnnotation {
            pitch,
            yaw,
            text: "marker".into(),
            color: None,
        }
    }

    #[test]
    fn marker_sits_inside_the_surface() {
        let m = Marker::new(annotation(0.0, 0.0), SPHERE_RADIUS);
        assert!(m.position.abs_diff_eq(Vec3::new(490.0, 0.0, 0.0), 1e-2));

        let top = Marker::new(annotation(90.0, 0.0), SPHERE_RADIUS);
        assert!(top.position.abs_diff_eq(Vec3::new(0.0, 490.0, 0.0), 1e-2));
    }

    #[test]
    fn marker_radius_ratio_holds_everywhere() {
        for (pitch, yaw) in [(12.0, 33.0), (-60.0, 200.0), (89.0, 359.0)] {
            let m = Marker::new(annotation(pitch, yaw), SPHERE_RADIUS);
            let r = m.position.length();
            assert!(((r / SPHERE_RADIUS) - MARKER_RADIUS_RATIO).abs() < 1e-4);
        }
    }

    #[test]
    fn quad_faces_the_camera_and_grows_on_hover() {
        let mut m = Marker::new(annotation(10.0, 40.0), SPHERE_RADIUS);
        let corners = m.quad_corners();
        let normal = (corners[1] - corners[0]).cross(corners[3] - corners[0]);
        assert!(normal.normalize().abs_diff_eq((-m.position).normalize(), 1e-3));

        let idle_w = (corners[1] - corners[0]).length();
        m.state = MarkerState::Hovered;
        let hovered_w = {
            let c = m.quad_corners();
            (c[1] - c[0]).length()
        };
        assert!((hovered_w / idle_w - HOVERED_SCALE).abs() < 1e-3);
    }

    #[test]
    fn projection_centers_the_marker_ahead() {
        let cam = OrbitCamera::new(); // looking along +X
        let vp = cam.view_proj(16.0 / 9.0);
        let m = Marker::new(annotation(0.0, 0.0), SPHERE_RADIUS);
        let [sx, sy] = m.project(&vp, 1600.0, 900.0).unwrap();
        assert!((sx - 800.0).abs() < 1.0);
        assert!((sy - 450.0).abs() < 1.0);
    }

    #[test]
    fn projection_rejects_markers_behind() {
        let cam = OrbitCamera::new();
        let vp = cam.view_proj(16.0 / 9.0);
        let behind = Marker::new(annotation(0.0, 180.0), SPHERE_RADIUS);
        assert!(behind.project(&vp, 1600.0, 900.0).is_none());
    }

    #[test]
    fn hover_picks_the_nearest_front_marker() {
        let cam = OrbitCamera::new();
        let vp = cam.view_proj(16.0 / 9.0);
        let markers = vec![
            Marker::new(annotation(0.0, 0.0), SPHERE_RADIUS),
            Marker::new(annotation(2.0, 2.0), SPHERE_RADIUS),
            Marker::new(annotation(0.0, 180.0), SPHERE_RADIUS),
        ];

        let center = markers[0].project(&vp, 1600.0, 900.0).unwrap();
        assert_eq!(hovered_index(&markers, center, &vp, 1600.0, 900.0), Some(0));

        // Far away from every marker: nothing hovers.
        assert_eq!(hovered_index(&markers, [5.0, 5.0], &vp, 1600.0, 900.0), None);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(parse_color("#ffffff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_color("#000000"), Some([0.0, 0.0, 0.0]));
        let c = parse_color("#ff8800").unwrap();
        assert!((c[0] - 1.0).abs() < 1e-6);
        assert!((c[1] - 136.0 / 255.0).abs() < 1e-6);
        assert_eq!(parse_color("ff8800"), None);
        assert_eq!(parse_color("#ff88"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn bad_color_falls_back_to_default() {
        let m = Marker::new(
            HotspotAnnotation {
                pitch: 0.0,
                yaw: 0.0,
                text: "x".into(),
                color: Some("teal".into()),
            },
            SPHERE_RADIUS,
        );
        assert_eq!(m.color, DEFAULT_MARKER_COLOR);
    }
}
