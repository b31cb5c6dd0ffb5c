//! Velocity-limited input positions.
//!
//! Raw target positions from the store are followed at no more than the
//! input's maximum speed. The step size eases in near the target with a
//! `tanh` shape so sources settle instead of stopping dead.

use wavefield_core::{Position, Vec3};

/// Distance under which a source snaps onto its target.
pub const SNAP_DISTANCE: f32 = 0.001;

/// Controls how early the ease-in starts, in multiples of one full step.
const EASE_STEPS: f32 = 5.0;

#[derive(Debug, Clone, Copy)]
struct LimiterChannel {
    target: Position,
    current: Position,
    active: bool,
    max_speed: f32,
    initialized: bool,
}

impl Default for LimiterChannel {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            current: Vec3::ZERO,
            active: false,
            max_speed: 1.0,
            initialized: false,
        }
    }
}

impl LimiterChannel {
    fn remaining(&self) -> f32 {
        self.current.distance(self.target)
    }

    fn step(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }
        let distance = self.remaining();
        if distance < SNAP_DISTANCE || !self.active {
            self.current = self.target;
            return;
        }

        let max_step = self.max_speed * dt.max(0.0);
        if max_step <= 0.0 {
            return;
        }
        let x = EASE_STEPS * max_step / distance;
        let scale = x.tanh() / x;
        let step = distance.min(max_step * scale);

        self.current += (self.target - self.current) * (step / distance);
    }
}

/// Per-input speed limiter.
#[derive(Debug, Clone, Default)]
pub struct InputSpeedLimiter {
    channels: Vec<LimiterChannel>,
}

impl InputSpeedLimiter {
    pub fn new(num_inputs: usize) -> Self {
        Self {
            channels: vec![LimiterChannel::default(); num_inputs],
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.channels.len()
    }

    /// Grow or shrink the channel list. New channels start uninitialized.
    pub fn resize(&mut self, num_inputs: usize) {
        self.channels.resize(num_inputs, LimiterChannel::default());
    }

    /// Set where an input should go. The first target places the input
    /// there directly.
    pub fn set_target_position(&mut self, input: usize, target: Position) {
        let Some(channel) = self.channels.get_mut(input) else {
            return;
        };
        channel.target = target;
        if !channel.initialized {
            channel.current = target;
            channel.initialized = true;
        }
    }

    pub fn set_speed_limit(&mut self, input: usize, active: bool, max_speed: f32) {
        if let Some(channel) = self.channels.get_mut(input) {
            channel.active = active;
            channel.max_speed = max_speed.clamp(0.01, 20.0);
        }
    }

    /// Jump straight to `position` without gliding.
    pub fn reset_position(&mut self, input: usize, position: Position) {
        if let Some(channel) = self.channels.get_mut(input) {
            channel.target = position;
            channel.current = position;
            channel.initialized = true;
        }
    }

    /// Advance every input by `dt` seconds.
    pub fn process(&mut self, dt: f32) {
        for channel in &mut self.channels {
            channel.step(dt);
        }
    }

    /// Current limited position, `Vec3::ZERO` for unknown inputs.
    pub fn interpolated_position(&self, input: usize) -> Position {
        self.channels
            .get(input)
            .map_or(Vec3::ZERO, |channel| channel.current)
    }

    pub fn target_position(&self, input: usize) -> Position {
        self.channels
            .get(input)
            .map_or(Vec3::ZERO, |channel| channel.target)
    }

    pub fn is_input_moving(&self, input: usize) -> bool {
        self.channels
            .get(input)
            .is_some_and(|channel| channel.initialized && channel.remaining() >= SNAP_DISTANCE)
    }

    pub fn is_any_input_moving(&self) -> bool {
        (0..self.channels.len()).any(|input| self.is_input_moving(input))
    }
}
