//! Motion paths and progress shaping.

use std::f32::consts::PI;

use wavefield_core::coordinates::{
    clamp_elevation, cylindrical_to_cartesian, normalize_angle, spherical_to_cartesian,
};
use wavefield_core::{Cylindrical, Position, Spherical, Vec3};

/// Horizontal path length below which a curved path is drawn straight.
const MIN_CURVE_LENGTH: f32 = 0.001;

/// Coordinate system a motion is captured and interpolated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateMode {
    #[default]
    Cartesian,
    Cylindrical,
    Spherical,
}

impl CoordinateMode {
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => CoordinateMode::Cylindrical,
            2 => CoordinateMode::Spherical,
            _ => CoordinateMode::Cartesian,
        }
    }
}

/// Start and target of one motion leg in its native coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionPath {
    /// Straight or XY-bent line. `curve` is a percentage in [-100, 100].
    Cartesian {
        start: Position,
        target: Position,
        curve: f32,
    },
    /// Radius, azimuth and height interpolated directly, so a changing
    /// radius at constant angular rate draws a spiral.
    Cylindrical { start: Cylindrical, target: Cylindrical },
    Spherical { start: Spherical, target: Spherical },
}

impl MotionPath {
    /// Position at `progress` in [0, 1].
    pub fn position(&self, progress: f32) -> Position {
        match *self {
            MotionPath::Cartesian {
                start,
                target,
                curve,
            } => curved_point(start, target, curve, progress),
            MotionPath::Cylindrical { start, target } => cylindrical_to_cartesian(Cylindrical {
                radius: lerp(start.radius, target.radius, progress).max(0.0),
                azimuth: lerp(start.azimuth, target.azimuth, progress),
                height: lerp(start.height, target.height, progress),
            }),
            MotionPath::Spherical { start, target } => {
                let elevation = lerp(start.elevation, target.elevation, progress);
                spherical_to_cartesian(Spherical {
                    radius: lerp(start.radius, target.radius, progress).max(0.0),
                    azimuth: lerp(start.azimuth, target.azimuth, progress),
                    elevation: clamp_elevation(normalize_angle(elevation)),
                })
            }
        }
    }

    pub fn origin(&self) -> Position {
        self.position(0.0)
    }

    pub fn destination(&self) -> Position {
        self.position(1.0)
    }

    /// The same path travelled backwards.
    ///
    /// Negating the curve keeps the bend on the same side once the endpoints
    /// are swapped.
    pub fn reversed(&self) -> Self {
        match *self {
            MotionPath::Cartesian {
                start,
                target,
                curve,
            } => MotionPath::Cartesian {
                start: target,
                target: start,
                curve: -curve,
            },
            MotionPath::Cylindrical { start, target } => MotionPath::Cylindrical {
                start: target,
                target: start,
            },
            MotionPath::Spherical { start, target } => MotionPath::Spherical {
                start: target,
                target: start,
            },
        }
    }

    pub fn mode(&self) -> CoordinateMode {
        match self {
            MotionPath::Cartesian { .. } => CoordinateMode::Cartesian,
            MotionPath::Cylindrical { .. } => CoordinateMode::Cylindrical,
            MotionPath::Spherical { .. } => CoordinateMode::Spherical,
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Signed shortest angular step from `from` to `to`, in degrees.
#[inline]
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Blend linear progress with a cosine bell by `profile_percent`.
///
/// 0 % is constant speed, 100 % starts and ends at rest.
#[inline]
pub fn apply_speed_profile(linear: f32, profile_percent: f32) -> f32 {
    let t = linear.clamp(0.0, 1.0);
    let bell = (1.0 - (PI * t).cos()) * 0.5;
    lerp(t, bell, (profile_percent / 100.0).clamp(0.0, 1.0))
}

/// Point on a line from `start` to `target` bent sideways in the XY plane.
///
/// The bend follows `sin(pi * progress)`, so it vanishes at both ends and
/// peaks at half the horizontal length for a curve of 100 %. Z is never bent.
pub fn curved_point(start: Position, target: Position, curve: f32, progress: f32) -> Position {
    let linear = start + (target - start) * progress;
    if curve == 0.0 {
        return linear;
    }

    let dx = target.x - start.x;
    let dy = target.y - start.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < MIN_CURVE_LENGTH {
        return linear;
    }

    let perpendicular = Vec3::new(dy / length, -dx / length, 0.0);
    let displacement = 0.5 * (curve / 100.0) * length * (PI * progress).sin();
    linear + perpendicular * displacement
}
