//! Headphone monitoring through two virtual speakers.
//!
//! A listener stands at a configurable distance and angle from the stage
//! center, facing it. Two virtual speakers sit half the spacing in front of
//! the listener, 45° to either side, and face back toward the listener. Each
//! input is rendered to them with the same keystone and inverse distance law
//! the room routings use.

use std::sync::Arc;

use parking_lot::Mutex;
use wavefield_core::coordinates::angle_between;
use wavefield_core::math::db_to_gain;
use wavefield_core::{GlobalParam, ParamReader, ParameterStore, Position, Vec3};

use super::geometry::{distance_gain, keystone, AttenuationLaw, DelayMode, MIN_DISTANCE};
use super::matrix::RoutingValue;

/// Left and right virtual speaker values for one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinauralOutput {
    pub left: RoutingValue,
    pub right: RoutingValue,
}

impl BinauralOutput {
    pub const SILENT: BinauralOutput = BinauralOutput {
        left: RoutingValue::SILENT,
        right: RoutingValue::SILENT,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VirtualSpeaker {
    position: Position,
    facing: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ListenerSetup {
    listener: Position,
    forward: Vec3,
    speakers: [VirtualSpeaker; 2],
    speed_of_sound: f32,
    reference_distance: f32,
    air_absorption: f32,
    trim_gain: f32,
    delay_ms: f32,
    angle_on: f32,
    angle_off: f32,
}

impl ListenerSetup {
    fn read(store: &dyn ParameterStore) -> Self {
        let center = Vec3::new(
            store.value(GlobalParam::StageCenterX.into()),
            store.value(GlobalParam::StageCenterY.into()),
            store.value(GlobalParam::StageCenterZ.into()),
        );
        let distance = store.value(GlobalParam::BinauralDistance.into());
        let angle = store.value(GlobalParam::BinauralAngle.into()).to_radians();
        let listener = center + Vec3::new(angle.cos(), angle.sin(), 0.0) * distance;

        let toward_center = Vec3::new(center.x - listener.x, center.y - listener.y, 0.0);
        let forward = if toward_center.length() > MIN_DISTANCE {
            toward_center.normalize()
        } else {
            Vec3::Y
        };

        let half_spacing = store.value(GlobalParam::BinauralSpacing.into()) * 0.5;
        let speaker = |degrees: f32| {
            let (sin, cos) = degrees.to_radians().sin_cos();
            let direction = Vec3::new(
                forward.x * cos - forward.y * sin,
                forward.x * sin + forward.y * cos,
                0.0,
            );
            VirtualSpeaker {
                position: listener + direction * half_spacing,
                facing: -forward,
            }
        };

        Self {
            listener,
            forward,
            speakers: [speaker(45.0), speaker(-45.0)],
            speed_of_sound: store.value(GlobalParam::SpeedOfSound.into()),
            reference_distance: store.value(GlobalParam::ReferenceDistance.into()),
            air_absorption: store.value(GlobalParam::AirAbsorption.into()),
            trim_gain: db_to_gain(store.value(GlobalParam::BinauralTrim.into())),
            delay_ms: store.value(GlobalParam::BinauralDelay.into()),
            angle_on: store.value(GlobalParam::BinauralAngleOn.into()),
            angle_off: store.value(GlobalParam::BinauralAngleOff.into()),
        }
    }

    fn render(&self, speaker: &VirtualSpeaker, source: Position) -> RoutingValue {
        let distance = source.distance(speaker.position);
        RoutingValue {
            delay_ms: DelayMode::AcousticPrecedence.delay_ms(
                source,
                speaker.position,
                speaker.position,
                self.speed_of_sound,
            ) + self.delay_ms,
            level: distance_gain(
                AttenuationLaw::InversePower,
                distance,
                self.reference_distance,
                0.0,
                1.0,
            ) * keystone(
                angle_between(speaker.facing, speaker.position - source),
                self.angle_on,
                self.angle_off,
            ) * self.trim_gain,
            hf_db: -self.air_absorption * distance,
        }
        .sanitized()
    }
}

/// Binaural renderer reading composite positions from the spatial engine.
pub struct BinauralEngine {
    store: Arc<dyn ParameterStore>,
    positions: Arc<Mutex<Vec<Position>>>,
    setup: ListenerSetup,
}

impl BinauralEngine {
    /// `positions` is the spatial engine's composite position cache.
    pub fn new(store: Arc<dyn ParameterStore>, positions: Arc<Mutex<Vec<Position>>>) -> Self {
        let setup = ListenerSetup::read(store.as_ref());
        Self {
            store,
            positions,
            setup,
        }
    }

    /// Re-derive the listener and virtual speakers after a listener
    /// parameter changed.
    pub fn update_listener(&mut self) {
        self.setup = ListenerSetup::read(self.store.as_ref());
        tracing::debug!(
            "Binaural listener at ({:.2}, {:.2}, {:.2})",
            self.setup.listener.x,
            self.setup.listener.y,
            self.setup.listener.z
        );
    }

    pub fn listener_position(&self) -> Position {
        self.setup.listener
    }

    /// Unit vector the listener faces.
    pub fn listener_forward(&self) -> Vec3 {
        self.setup.forward
    }

    /// Left and right virtual speaker positions.
    pub fn speaker_positions(&self) -> [Position; 2] {
        self.setup.speakers.map(|speaker| speaker.position)
    }

    /// Render one input. Unknown inputs are silent.
    pub fn calculate(&self, input: usize) -> BinauralOutput {
        let Some(source) = self.positions.lock().get(input).copied() else {
            return BinauralOutput::SILENT;
        };
        self.calculate_at(source)
    }

    /// Render a source at an explicit position.
    pub fn calculate_at(&self, source: Position) -> BinauralOutput {
        let [left, right] = &self.setup.speakers;
        BinauralOutput {
            left: self.setup.render(left, source),
            right: self.setup.render(right, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wavefield_core::MemoryParameterStore;

    fn setup(positions: Vec<Position>) -> (Arc<MemoryParameterStore>, BinauralEngine) {
        let store = Arc::new(MemoryParameterStore::new());
        let engine = BinauralEngine::new(store.clone(), Arc::new(Mutex::new(positions)));
        (store, engine)
    }

    #[test]
    fn test_default_listener_faces_stage() {
        let (_store, engine) = setup(Vec::new());
        let listener = engine.listener_position();
        assert_relative_eq!(listener.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(listener.y, -10.0, epsilon = 1e-5);
        assert_relative_eq!(engine.listener_forward().y, 1.0, epsilon = 1e-5);

        let [left, right] = engine.speaker_positions();
        assert!(left.x < 0.0 && right.x > 0.0);
        assert_relative_eq!(left.distance(listener), 0.15, epsilon = 1e-5);
        assert_relative_eq!(left.y, right.y, epsilon = 1e-5);
        assert!(left.y > listener.y);
    }

    #[test]
    fn test_centered_source_is_balanced() {
        let (_store, engine) = setup(vec![Vec3::new(0.0, 5.0, 0.0)]);
        let out = engine.calculate(0);
        assert_relative_eq!(out.left.delay_ms, out.right.delay_ms, epsilon = 1e-4);
        assert_relative_eq!(out.left.level, out.right.level, epsilon = 1e-5);
        assert!(out.left.level > 0.0);
        assert!(out.left.hf_db < 0.0);
    }

    #[test]
    fn test_side_source_favors_near_ear() {
        let (_store, engine) = setup(vec![Vec3::new(-8.0, -5.0, 0.0)]);
        let out = engine.calculate(0);
        assert!(out.left.level > out.right.level);
        assert!(out.left.delay_ms < out.right.delay_ms);
    }

    #[test]
    fn test_source_behind_listener_is_silent() {
        let (store, mut engine) = setup(vec![Vec3::new(0.0, -20.0, 0.0)]);
        store.set(GlobalParam::BinauralAngleOff.into(), 150.0);
        engine.update_listener();
        let out = engine.calculate(0);
        assert_eq!(out.left.level, 0.0);
        assert_eq!(out.right.level, 0.0);
    }

    #[test]
    fn test_trim_delay_and_listener_update() {
        let (store, mut engine) = setup(Vec::new());
        store.set(GlobalParam::BinauralTrim.into(), -6.0);
        store.set(GlobalParam::BinauralDelay.into(), 10.0);
        store.set(GlobalParam::BinauralAngle.into(), 0.0);
        engine.update_listener();

        assert_relative_eq!(engine.listener_position().x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(engine.listener_forward().x, -1.0, epsilon = 1e-5);

        let out = engine.calculate_at(Vec3::ZERO);
        let distance = engine.speaker_positions()[0].length();
        assert_relative_eq!(
            out.left.delay_ms,
            distance / 343.0 * 1000.0 + 10.0,
            epsilon = 1e-3
        );
        assert_relative_eq!(out.left.level, db_to_gain(-6.0) / distance, epsilon = 1e-4);
    }

    #[test]
    fn test_unknown_input_is_silent() {
        let (_store, engine) = setup(Vec::new());
        assert_eq!(engine.calculate(3), BinauralOutput::SILENT);
    }
}
