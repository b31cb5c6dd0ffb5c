//! Per-routing geometry laws: delay, distance attenuation, keystone,
//! sidelines and directivity.

use wavefield_core::math::db_to_gain;
use wavefield_core::{GlobalParam, ParamReader, ParameterStore, Position, Vec3};

/// Floor for distances used as divisors.
pub const MIN_DISTANCE: f32 = 1.0e-3;

/// How an input's delays relate to its speakers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMode {
    /// Plain propagation time from the source to each speaker, so the
    /// nearest speaker is always heard first.
    #[default]
    AcousticPrecedence,
    /// Only the extra path the virtual source adds for the speaker's listener
    /// beyond the speaker's own path.
    MinimalLatency,
}

impl DelayMode {
    pub fn from_flag(minimal_latency: bool) -> Self {
        if minimal_latency {
            DelayMode::MinimalLatency
        } else {
            DelayMode::AcousticPrecedence
        }
    }

    /// Delay in ms before any trim.
    #[inline]
    pub fn delay_ms(
        &self,
        source: Position,
        speaker: Position,
        listener: Position,
        speed_of_sound: f32,
    ) -> f32 {
        let path = match self {
            DelayMode::AcousticPrecedence => speaker.distance(source),
            DelayMode::MinimalLatency => {
                (listener.distance(source) - listener.distance(speaker)).max(0.0)
            }
        };
        path / speed_of_sound.max(1.0) * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttenuationLaw {
    /// Fixed dB per decade of distance.
    #[default]
    Logarithmic,
    /// `(d0 / d) ^ ratio`.
    InversePower,
}

impl AttenuationLaw {
    pub fn from_index(index: usize) -> Self {
        if index == 1 {
            AttenuationLaw::InversePower
        } else {
            AttenuationLaw::Logarithmic
        }
    }
}

/// Linear gain for `distance`, unity inside the reference distance.
///
/// `db_per_decade` applies to the logarithmic law, `ratio` to the inverse
/// power law.
#[inline]
pub fn distance_gain(
    law: AttenuationLaw,
    distance: f32,
    reference: f32,
    db_per_decade: f32,
    ratio: f32,
) -> f32 {
    let reference = reference.max(MIN_DISTANCE);
    let relative = distance.max(reference) / reference;
    match law {
        AttenuationLaw::Logarithmic => db_to_gain(-db_per_decade * relative.log10()),
        AttenuationLaw::InversePower => relative.powf(-ratio),
    }
}

/// Keystone gain for an off-axis angle in degrees.
///
/// 1 within `angle_on`, 0 beyond `angle_off`, linear in between.
#[inline]
pub fn keystone(angle: f32, angle_on: f32, angle_off: f32) -> f32 {
    if angle <= angle_on {
        1.0
    } else if angle >= angle_off {
        0.0
    } else {
        1.0 - (angle - angle_on) / (angle_off - angle_on)
    }
}

/// High-frequency shelf for a source with limited directivity.
///
/// 0 dB within half the directivity angle of the source's facing, reaching
/// `shelf_db` straight behind it.
#[inline]
pub fn directivity_shelf(angle: f32, directivity: f32, shelf_db: f32) -> f32 {
    let half = directivity * 0.5;
    if angle <= half || half >= 180.0 {
        0.0
    } else {
        shelf_db * ((angle - half) / (180.0 - half)).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageShape {
    #[default]
    Box,
    Cylinder,
    Dome,
}

impl StageShape {
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => StageShape::Cylinder,
            2 => StageShape::Dome,
            _ => StageShape::Box,
        }
    }
}

/// Stage extent and sideline fade settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub shape: StageShape,
    pub center: Position,
    pub width: f32,
    pub depth: f32,
    pub diameter: f32,
    pub sidelines: bool,
    pub fringe: f32,
}

impl Stage {
    pub fn from_store(store: &dyn ParameterStore) -> Self {
        Self {
            shape: StageShape::from_index(store.index(GlobalParam::StageShape.into())),
            center: Vec3::new(
                store.value(GlobalParam::StageCenterX.into()),
                store.value(GlobalParam::StageCenterY.into()),
                store.value(GlobalParam::StageCenterZ.into()),
            ),
            width: store.value(GlobalParam::StageWidth.into()),
            depth: store.value(GlobalParam::StageDepth.into()),
            diameter: store.value(GlobalParam::StageDiameter.into()),
            sidelines: store.flag(GlobalParam::SidelinesActive.into()),
            fringe: store.value(GlobalParam::SidelinesFringe.into()),
        }
    }

    /// Edge fade for a source, 1 well inside the stage and 0 at or beyond
    /// the edge.
    ///
    /// Box stages fade toward the left, right and upstage edges only; the
    /// downstage edge faces the audience.
    pub fn sideline_gain(&self, source: Position) -> f32 {
        if !self.sidelines {
            return 1.0;
        }
        let local = source - self.center;
        let inside = match self.shape {
            StageShape::Box => {
                let half_width = self.width * 0.5;
                let to_side = half_width - local.x.abs();
                let to_back = self.depth * 0.5 - local.y;
                to_side.min(to_back)
            }
            StageShape::Cylinder => {
                self.diameter * 0.5 - (local.x * local.x + local.y * local.y).sqrt()
            }
            StageShape::Dome => self.diameter * 0.5 - local.length(),
        };
        (inside / self.fringe.max(MIN_DISTANCE)).clamp(0.0, 1.0)
    }
}
