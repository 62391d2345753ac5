// spherical.rs — pitch/yaw annotation coordinates to cartesian points

use glam::Vec3;

/// Map an elevation/azimuth pair onto the sphere of the given radius.
///
/// `pitch` is elevation in degrees (90 = straight up), `yaw` is azimuth in
/// degrees. The polar angle is `90° − pitch`; `y` grows with pitch while
/// `x`/`z` span the azimuthal plane:
///
/// ```text
/// x = r·sin(φ)·cos(θ)    φ = (90° − pitch) in radians
/// y = r·cos(φ)           θ = yaw in radians
/// z = r·sin(φ)·sin(θ)
/// ```
///
/// Out-of-range input is normalized rather than rejected: pitch clamps to
/// [-90, 90] and yaw wraps into [0, 360), matching how the camera treats its
/// own angles.
pub fn spherical_to_cartesian(pitch: f32, yaw: f32, radius: f32) -> Vec3 {
    let pitch = pitch.clamp(-90.0, 90.0);
    let yaw = yaw.rem_euclid(360.0);

    let phi = (90.0 - pitch).to_radians();
    let theta = yaw.to_radians();

    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn point_stays_on_sphere() {
        let radius = 500.0;
        for pitch in (-90..=90).step_by(15) {
            for yaw in (0..360).step_by(15) {
                let p = spherical_to_cartesian(pitch as f32, yaw as f32, radius);
                let rel = (p.length() - radius).abs() / radius;
                assert!(
                    rel < EPS,
                    "({pitch}, {yaw}) landed at distance {} from the origin",
                    p.length()
                );
            }
        }
    }

    #[test]
    fn north_pole_ignores_yaw() {
        for yaw in [0.0, 45.0, 123.0, 359.0] {
            let p = spherical_to_cartesian(90.0, yaw, 100.0);
            assert!(p.abs_diff_eq(Vec3::new(0.0, 100.0, 0.0), 1e-2), "yaw {yaw} gave {p}");
        }
    }

    #[test]
    fn south_pole_ignores_yaw() {
        let p = spherical_to_cartesian(-90.0, 270.0, 100.0);
        assert!(p.abs_diff_eq(Vec3::new(0.0, -100.0, 0.0), 1e-2));
    }

    #[test]
    fn equator_axes() {
        let px = spherical_to_cartesian(0.0, 0.0, 1.0);
        assert!(px.abs_diff_eq(Vec3::X, EPS), "yaw 0 gave {px}");

        let pz = spherical_to_cartesian(0.0, 90.0, 1.0);
        assert!(pz.abs_diff_eq(Vec3::Z, EPS), "yaw 90 gave {pz}");
    }

    #[test]
    fn out_of_range_pitch_clamps() {
        let over = spherical_to_cartesian(120.0, 30.0, 50.0);
        let pole = spherical_to_cartesian(90.0, 30.0, 50.0);
        assert!(over.abs_diff_eq(pole, EPS));
    }

    #[test]
    fn out_of_range_yaw_wraps() {
        let wrapped = spherical_to_cartesian(10.0, 370.0, 50.0);
        let direct = spherical_to_cartesian(10.0, 10.0, 50.0);
        assert!(wrapped.abs_diff_eq(direct, EPS));

        let negative = spherical_to_cartesian(10.0, -90.0, 50.0);
        let positive = spherical_to_cartesian(10.0, 270.0, 50.0);
        assert!(negative.abs_diff_eq(positive, EPS));
    }
}
