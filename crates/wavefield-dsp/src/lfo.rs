//! Per-input low frequency position modulation.
//!
//! Each input has one main ramp advancing at `1 / period`. The three axes
//! derive their own ramps from it (rate multiplier plus phase) and shape them
//! into [-1, 1]. The main ramp also drives the gyrophone rotation, so one
//! rotation always takes one period.

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use wavefield_core::math::wrap_unit;
use wavefield_core::{InputParam, LinearRamp, ParamKey, ParamReader, ParameterStore, Vec3};

/// Fade in/out time when an LFO is switched on or off.
pub const FADE_TIME: f32 = 0.5;

const MIN_PERIOD: f32 = 0.01;
const MAX_PERIOD: f32 = 100.0;

/// Keeps per-axis ramps positive before wrapping.
const PHASE_BIAS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LfoWaveform {
    #[default]
    Off,
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Keystone,
    Log,
    Exp,
    Random,
}

impl LfoWaveform {
    pub fn all() -> &'static [LfoWaveform] {
        &[
            LfoWaveform::Off,
            LfoWaveform::Sine,
            LfoWaveform::Square,
            LfoWaveform::Sawtooth,
            LfoWaveform::Triangle,
            LfoWaveform::Keystone,
            LfoWaveform::Log,
            LfoWaveform::Exp,
            LfoWaveform::Random,
        ]
    }

    /// Waveform for a stored shape index; unknown indices read as `Off`.
    pub fn from_index(index: usize) -> Self {
        Self::all().get(index).copied().unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            LfoWaveform::Off => "Off",
            LfoWaveform::Sine => "Sine",
            LfoWaveform::Square => "Square",
            LfoWaveform::Sawtooth => "Sawtooth",
            LfoWaveform::Triangle => "Triangle",
            LfoWaveform::Keystone => "Keystone",
            LfoWaveform::Log => "Log",
            LfoWaveform::Exp => "Exp",
            LfoWaveform::Random => "Random",
        }
    }

    /// Map a ramp in [0, 1] onto [-1, 1].
    ///
    /// `Random` depends on per-axis state and evaluates to 0 here.
    #[inline]
    pub fn apply(&self, ramp: f32) -> f32 {
        match self {
            LfoWaveform::Off | LfoWaveform::Random => 0.0,
            LfoWaveform::Sine => -(TAU * ramp).cos(),
            LfoWaveform::Square => {
                if ramp < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoWaveform::Sawtooth => 2.0 * ramp - 1.0,
            LfoWaveform::Triangle => 1.0 - 4.0 * (ramp - 0.5).abs(),
            LfoWaveform::Keystone => {
                if !(0.25..0.75).contains(&ramp) {
                    -1.0
                } else {
                    1.0 - 8.0 * (ramp - 0.5).abs()
                }
            }
            LfoWaveform::Log => 2.0 * (20.0 * ramp + 1.0).log10() / 21.0_f32.log10() - 1.0,
            LfoWaveform::Exp => (3.0_f32.powf(2.0 * ramp) - 1.0) / 8.0 * 2.0 - 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct LfoChannel {
    ramp: f32,
    fade: LinearRamp,
    axis_ramps: [f32; 3],
    random_from: [f32; 3],
    random_to: [f32; 3],
    normalized: Vec3,
    offset: Vec3,
    gyrophone: f32,
    rng: SmallRng,
}

impl LfoChannel {
    fn new(input: usize) -> Self {
        let mut rng = SmallRng::seed_from_u64(0x5746_5300 + input as u64);
        // First cycle glides from the centre to a real target.
        let random_to = [(); 3].map(|_| rng.gen_range(-1.0..=1.0));
        Self {
            ramp: 0.0,
            fade: LinearRamp::new(0.0),
            axis_ramps: [0.0; 3],
            random_from: [0.0; 3],
            random_to,
            normalized: Vec3::ZERO,
            offset: Vec3::ZERO,
            gyrophone: 0.0,
            rng,
        }
    }

    fn rest(&mut self) {
        self.ramp = 0.0;
        self.axis_ramps = [0.0; 3];
        self.normalized = Vec3::ZERO;
        self.offset = Vec3::ZERO;
        self.gyrophone = 0.0;
    }
}

/// Per-input LFO engine reading its settings from the parameter store.
pub struct LfoEngine {
    store: Arc<dyn ParameterStore>,
    channels: Vec<LfoChannel>,
}

impl LfoEngine {
    pub fn new(store: Arc<dyn ParameterStore>, num_inputs: usize) -> Self {
        Self {
            store,
            channels: (0..num_inputs).map(LfoChannel::new).collect(),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.channels.len()
    }

    pub fn resize(&mut self, num_inputs: usize) {
        let len = self.channels.len();
        if num_inputs < len {
            self.channels.truncate(num_inputs);
        } else {
            self.channels.extend((len..num_inputs).map(LfoChannel::new));
        }
    }

    /// Advance every input by `dt` seconds.
    pub fn process(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for (input, channel) in self.channels.iter_mut().enumerate() {
            Self::process_channel(self.store.as_ref(), input, channel, dt);
        }
    }

    fn process_channel(store: &dyn ParameterStore, input: usize, ch: &mut LfoChannel, dt: f32) {
        let key = |param| ParamKey::Input(input, param);
        let active = store.flag(key(InputParam::LfoActive));
        let fade = ch.fade.advance(if active { 1.0 } else { 0.0 }, dt, FADE_TIME);

        if !active && fade <= 0.0 {
            ch.rest();
            return;
        }

        let period = store.value(key(InputParam::LfoPeriod)).clamp(MIN_PERIOD, MAX_PERIOD);
        ch.ramp = wrap_unit(ch.ramp + dt / period);

        let global_phase = store.value(key(InputParam::LfoPhase));
        let mut normalized = [0.0; 3];
        let mut amplitude = [0.0; 3];
        for axis in 0..3 {
            let shape = LfoWaveform::from_index(store.index(key(InputParam::LFO_SHAPE[axis])));
            let rate = store.value(key(InputParam::LFO_RATE[axis]));
            let phase = store.value(key(InputParam::LFO_PHASE[axis]));
            amplitude[axis] = store.value(key(InputParam::LFO_AMPLITUDE[axis]));

            let previous = ch.axis_ramps[axis];
            let ramp = wrap_unit(ch.ramp * rate + (global_phase + phase) / 360.0 + PHASE_BIAS);
            ch.axis_ramps[axis] = ramp;

            normalized[axis] = if shape == LfoWaveform::Random {
                if ramp < previous {
                    ch.random_from[axis] = ch.random_to[axis];
                    ch.random_to[axis] = ch.rng.gen_range(-1.0..=1.0);
                }
                ch.random_from[axis] + (ch.random_to[axis] - ch.random_from[axis]) * ramp
            } else {
                shape.apply(ramp)
            };
        }

        ch.normalized = Vec3::from_array(normalized);
        ch.offset = ch.normalized * Vec3::from_array(amplitude) * fade;

        let gyro_sign = store.value(key(InputParam::LfoGyrophone));
        ch.gyrophone = gyro_sign * ch.ramp * TAU * fade;
    }

    /// Position offset in meters for an input.
    pub fn offset(&self, input: usize) -> Vec3 {
        self.channels.get(input).map_or(Vec3::ZERO, |ch| ch.offset)
    }

    /// Shaped per-axis values in [-1, 1] before amplitude and fade.
    pub fn normalized(&self, input: usize) -> Vec3 {
        self.channels.get(input).map_or(Vec3::ZERO, |ch| ch.normalized)
    }

    /// Gyrophone rotation in radians.
    pub fn gyrophone_offset(&self, input: usize) -> f32 {
        self.channels.get(input).map_or(0.0, |ch| ch.gyrophone)
    }

    /// Gyrophone rotation in degrees, wrapped for display and directivity.
    pub fn gyrophone_degrees(&self, input: usize) -> f32 {
        wavefield_core::coordinates::normalize_angle(self.gyrophone_offset(input) * 180.0 / PI)
    }

    pub fn fade_level(&self, input: usize) -> f32 {
        self.channels.get(input).map_or(0.0, |ch| ch.fade.value())
    }

    pub fn ramp(&self, input: usize) -> f32 {
        self.channels.get(input).map_or(0.0, |ch| ch.ramp)
    }

    /// True while the LFO is running or fading out.
    pub fn is_active(&self, input: usize) -> bool {
        self.fade_level(input) > 0.0
    }

    pub fn is_any_active(&self) -> bool {
        self.channels.iter().any(|ch| ch.fade.value() > 0.0)
    }
}
