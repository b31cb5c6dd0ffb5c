//! Cartesian / cylindrical / spherical conversion.
//!
//! Axes: x to the right, y upstage (away from the audience), z up.
//! Azimuth is counter-clockwise from +x in the XY plane; elevation is measured
//! from the XY plane. Angles are degrees at this API boundary.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Positions are meters in stage space.
pub type Position = Vec3;

/// Radius below which the azimuth is undefined and reported as 0°.
pub const RADIUS_EPSILON: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cylindrical {
    pub radius: f32,
    /// Degrees.
    pub azimuth: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spherical {
    pub radius: f32,
    /// Degrees.
    pub azimuth: f32,
    /// Degrees above the XY plane.
    pub elevation: f32,
}

impl Cylindrical {
    pub fn new(radius: f32, azimuth: f32, height: f32) -> Self {
        Self {
            radius,
            azimuth,
            height,
        }
    }
}

impl Spherical {
    pub fn new(radius: f32, azimuth: f32, elevation: f32) -> Self {
        Self {
            radius,
            azimuth,
            elevation,
        }
    }
}

/// Wrap an angle in degrees to (-180, 180].
#[inline]
pub fn normalize_angle(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let mut angle = degrees % 360.0;
    if angle <= -180.0 {
        angle += 360.0;
    } else if angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

#[inline]
pub fn clamp_elevation(degrees: f32) -> f32 {
    degrees.clamp(-90.0, 90.0)
}

#[inline]
fn azimuth_of(x: f32, y: f32, radius: f32) -> f32 {
    if radius <= RADIUS_EPSILON {
        0.0
    } else {
        y.atan2(x).to_degrees()
    }
}

pub fn cartesian_to_cylindrical(p: Position) -> Cylindrical {
    let radius = (p.x * p.x + p.y * p.y).sqrt();
    Cylindrical {
        radius,
        azimuth: azimuth_of(p.x, p.y, radius),
        height: p.z,
    }
}

pub fn cylindrical_to_cartesian(c: Cylindrical) -> Position {
    let theta = c.azimuth.to_radians();
    Vec3::new(c.radius * theta.cos(), c.radius * theta.sin(), c.height)
}

pub fn cartesian_to_spherical(p: Position) -> Spherical {
    let planar = (p.x * p.x + p.y * p.y).sqrt();
    let radius = p.length();
    let elevation = if radius <= RADIUS_EPSILON {
        0.0
    } else {
        p.z.atan2(planar).to_degrees()
    };
    Spherical {
        radius,
        azimuth: azimuth_of(p.x, p.y, planar),
        elevation,
    }
}

pub fn spherical_to_cartesian(s: Spherical) -> Position {
    let theta = s.azimuth.to_radians();
    let phi = s.elevation.to_radians();
    let planar = s.radius * phi.cos();
    Vec3::new(planar * theta.cos(), planar * theta.sin(), s.radius * phi.sin())
}

/// Unit vector for a facing direction.
///
/// Orientation 0° faces the audience (-y); positive orientation turns
/// counter-clockwise seen from above. Pitch tilts the axis up.
pub fn facing_vector(orientation_deg: f32, pitch_deg: f32) -> Vec3 {
    let theta = orientation_deg.to_radians();
    let pitch = pitch_deg.to_radians();
    Vec3::new(
        theta.sin() * pitch.cos(),
        -theta.cos() * pitch.cos(),
        pitch.sin(),
    )
}

/// Angle in degrees between two directions; 0 when either is degenerate.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom <= RADIUS_EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_relative_eq!(normalize_angle(270.0), -90.0);
        assert_relative_eq!(normalize_angle(-450.0), -90.0);
        assert_relative_eq!(normalize_angle(720.0), 0.0);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_clamp_elevation() {
        assert_eq!(clamp_elevation(120.0), 90.0);
        assert_eq!(clamp_elevation(-91.0), -90.0);
        assert_eq!(clamp_elevation(12.0), 12.0);
    }

    #[test]
    fn test_origin_has_zero_azimuth() {
        let c = cartesian_to_cylindrical(Vec3::ZERO);
        assert_eq!(c.radius, 0.0);
        assert_eq!(c.azimuth, 0.0);
        let s = cartesian_to_spherical(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(s.azimuth, 0.0);
        assert_eq!(s.elevation, 0.0);
    }

    #[test]
    fn test_straight_up_is_ninety_elevation() {
        let s = cartesian_to_spherical(Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(s.radius, 3.0);
        assert_relative_eq!(s.elevation, 90.0);
        assert_eq!(s.azimuth, 0.0);
    }

    #[test]
    fn test_spherical_known_point() {
        let p = spherical_to_cartesian(Spherical::new(2.0, 90.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_facing_vector_default_faces_audience() {
        let f = facing_vector(0.0, 0.0);
        assert_relative_eq!(f.y, -1.0, epsilon = 1e-6);
        let side = facing_vector(90.0, 0.0);
        assert_relative_eq!(side.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_angle_between() {
        assert_relative_eq!(angle_between(Vec3::X, Vec3::Y), 90.0, epsilon = 1e-4);
        assert_relative_eq!(angle_between(Vec3::X, -Vec3::X), 180.0, epsilon = 1e-4);
        assert_eq!(angle_between(Vec3::ZERO, Vec3::Y), 0.0);
    }

    proptest! {
        #[test]
        fn cylindrical_round_trip(
            r in 0.01f32..100.0,
            theta in -720.0f32..720.0,
            z in -50.0f32..50.0,
        ) {
            let back = cartesian_to_cylindrical(cylindrical_to_cartesian(Cylindrical::new(r, theta, z)));
            prop_assert!((back.radius - r).abs() < 1e-3 * r.max(1.0));
            let mut diff = (back.azimuth - normalize_angle(theta)).abs();
            if diff > 180.0 {
                diff = 360.0 - diff;
            }
            prop_assert!(diff < 0.05);
            prop_assert!((back.height - z).abs() < 1e-4);
        }

        #[test]
        fn spherical_round_trip(
            r in 0.1f32..100.0,
            theta in -179.0f32..179.0,
            phi in -80.0f32..80.0,
        ) {
            let back = cartesian_to_spherical(spherical_to_cartesian(Spherical::new(r, theta, phi)));
            prop_assert!((back.radius - r).abs() < 1e-3 * r.max(1.0));
            prop_assert!((back.elevation - phi).abs() < 0.05);
            prop_assert!((back.azimuth - theta).abs() < 0.05);
        }

        #[test]
        fn normalized_angle_in_range(a in -10_000.0f32..10_000.0) {
            let n = normalize_angle(a);
            prop_assert!(n > -180.0 && n <= 180.0);
        }
    }
}
