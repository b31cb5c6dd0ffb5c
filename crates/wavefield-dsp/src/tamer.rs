//! Live source tamer: proximity ducking of speakers close to a source.
//!
//! Speakers within an input's radius get attenuated, most strongly at the
//! center. The depth combines a fixed attenuation with the gain reduction of
//! the input's peak and slow dynamics detectors, which run elsewhere and are
//! handed in per tick.

use std::f32::consts::PI;
use std::sync::Arc;

use wavefield_core::math::{db_to_gain, lerp};
use wavefield_core::{
    InputParam, LinearRamp, OutputParam, ParamKey, ParamReader, ParameterStore, Position,
};

/// Time for the per-input enable ramp to go from off to fully on.
pub const ENABLE_RAMP_TIME: f32 = 0.5;

/// Taper from the center (t = 0) to the edge (t = 1) of the radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TamerShape {
    #[default]
    Linear,
    Log,
    Square,
    Sine,
}

impl TamerShape {
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => TamerShape::Log,
            2 => TamerShape::Square,
            3 => TamerShape::Sine,
            _ => TamerShape::Linear,
        }
    }

    /// Shape factor in [0, 1]: 1 at the center, 0 at the edge.
    #[inline]
    pub fn factor(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let f = match self {
            TamerShape::Linear => 1.0 - t,
            TamerShape::Log => 1.0 - (1.0 + 9.0 * t).log10(),
            TamerShape::Square => 1.0 - t * t,
            TamerShape::Sine => 0.5 + 0.5 * (PI * t).cos(),
        };
        f.clamp(0.0, 1.0)
    }
}

/// Per-(input, output) tamer gains, laid out `input * num_outputs + output`.
pub struct LiveSourceTamer {
    store: Arc<dyn ParameterStore>,
    num_inputs: usize,
    num_outputs: usize,
    ramps: Vec<LinearRamp>,
    peak_gr: Vec<f32>,
    slow_gr: Vec<f32>,
    gains: Vec<f32>,
    speakers: Vec<(Position, bool)>,
}

impl LiveSourceTamer {
    pub fn new(store: Arc<dyn ParameterStore>, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            store,
            num_inputs,
            num_outputs,
            ramps: vec![LinearRamp::new(0.0); num_inputs],
            peak_gr: vec![1.0; num_inputs],
            slow_gr: vec![1.0; num_inputs],
            gains: vec![1.0; num_inputs * num_outputs],
            speakers: Vec::with_capacity(num_outputs),
        }
    }

    pub fn resize(&mut self, num_inputs: usize, num_outputs: usize) {
        self.num_inputs = num_inputs;
        self.num_outputs = num_outputs;
        self.ramps.resize(num_inputs, LinearRamp::new(0.0));
        self.peak_gr.resize(num_inputs, 1.0);
        self.slow_gr.resize(num_inputs, 1.0);
        self.gains.clear();
        self.gains.resize(num_inputs * num_outputs, 1.0);
    }

    /// Linear gain reduction factors (0..1) from the peak and slow detectors.
    pub fn set_gain_reduction(&mut self, input: usize, peak_gr: f32, slow_gr: f32) {
        if input < self.num_inputs {
            self.peak_gr[input] = sanitize_gr(peak_gr);
            self.slow_gr[input] = sanitize_gr(slow_gr);
        }
    }

    /// Recompute gains from composite input positions.
    pub fn process(&mut self, dt: f32, positions: &[Position]) {
        let store = self.store.as_ref();

        self.speakers.clear();
        self.speakers.extend((0..self.num_outputs).map(|output| {
            (
                store.output_position(output),
                store.flag(ParamKey::Output(output, OutputParam::TamerBypass)),
            )
        }));

        for input in 0..self.num_inputs {
            let key = |param| ParamKey::Input(input, param);
            let active = store.flag(key(InputParam::TamerActive));
            let ramp = self.ramps[input].advance(
                if active { 1.0 } else { 0.0 },
                dt,
                ENABLE_RAMP_TIME,
            );

            let row = &mut self.gains[input * self.num_outputs..(input + 1) * self.num_outputs];
            let Some(source) = positions.get(input).copied().filter(|_| ramp > 0.0) else {
                row.fill(1.0);
                continue;
            };

            let radius = store.value(key(InputParam::TamerRadius)).max(f32::EPSILON);
            let shape = TamerShape::from_index(store.index(key(InputParam::TamerShape)));
            let combined = db_to_gain(store.value(key(InputParam::TamerAttenuation)))
                * self.peak_gr[input]
                * self.slow_gr[input];

            for (gain, &(speaker, bypass)) in row.iter_mut().zip(&self.speakers) {
                let t = speaker.distance(source) / radius;
                *gain = if bypass || t >= 1.0 {
                    1.0
                } else {
                    let target = lerp(1.0, combined, shape.factor(t));
                    lerp(1.0, target, ramp)
                };
            }
        }
    }

    /// All gains, `input * num_outputs + output`.
    pub fn gains(&self) -> &[f32] {
        &self.gains
    }

    pub fn gain(&self, input: usize, output: usize) -> f32 {
        if input >= self.num_inputs || output >= self.num_outputs {
            return 1.0;
        }
        self.gains[input * self.num_outputs + output]
    }

    pub fn ramp_progress(&self, input: usize) -> f32 {
        self.ramps.get(input).map_or(0.0, |ramp| ramp.value())
    }

    /// Some input's enable ramp is between off and on.
    pub fn is_any_input_ramping(&self) -> bool {
        self.ramps
            .iter()
            .any(|ramp| ramp.value() > 0.0 && ramp.value() < 1.0)
    }

    pub fn is_any_input_active(&self) -> bool {
        self.ramps.iter().any(|ramp| ramp.value() > 0.0)
    }
}

#[inline]
fn sanitize_gr(gr: f32) -> f32 {
    if gr.is_finite() {
        gr.clamp(0.0, 1.0)
    } else {
        1.0
    }
}
