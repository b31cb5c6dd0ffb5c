//! Time-based ramps for click-free control transitions.
//!
//! Everything here advances by an explicit `dt` in seconds rather than a
//! sample count, so a control loop with jittery tick deltas does not drift.
//!
//! # Example
//!
//! ```
//! use wavefield_core::ResidualRamp;
//!
//! // A delay law switch moved routing 0 by -3 ms; fade that step out over 1 s.
//! let mut ramp = ResidualRamp::new(1, 1.0);
//! ramp.start(&[3.0]);
//! assert_eq!(ramp.offset(0), 3.0);
//!
//! ramp.advance(0.5);
//! assert!((ramp.offset(0) - 1.5).abs() < 1e-6);
//! ```

/// A value moving linearly toward a target at `1 / ramp_time` per second.
///
/// Used for fade levels and enable ramps in the 0..1 range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearRamp {
    value: f32,
}

impl LinearRamp {
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    /// Move toward `target` by at most `dt / ramp_time`, returning the new value.
    #[inline]
    pub fn advance(&mut self, target: f32, dt: f32, ramp_time: f32) -> f32 {
        let step = if ramp_time > 0.0 {
            dt.max(0.0) / ramp_time
        } else {
            f32::INFINITY
        };
        let delta = target - self.value;
        if delta.abs() <= step {
            self.value = target;
        } else {
            self.value += step.copysign(delta);
        }
        self.value
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: f32) {
        self.value = value;
    }

    #[inline]
    pub fn is_at(&self, target: f32) -> bool {
        self.value == target
    }
}

/// Per-routing residual offsets that decay linearly to zero.
///
/// When a discrete mode flips, the caller records `old - new` for every
/// routing. The offset is added on top of the new value and fades out over
/// `duration`, so the published value never steps.
#[derive(Debug, Clone, Default)]
pub struct ResidualRamp {
    residual: Vec<f32>,
    remaining: f32,
    duration: f32,
}

impl ResidualRamp {
    pub fn new(len: usize, duration_secs: f32) -> Self {
        Self {
            residual: vec![0.0; len],
            remaining: 0.0,
            duration: duration_secs.max(f32::EPSILON),
        }
    }

    /// Start (or restart) the ramp.
    ///
    /// A restart folds the still-decaying offset into the new residuals so an
    /// interrupted ramp continues from where it was.
    pub fn start(&mut self, deltas: &[f32]) {
        let factor = self.factor();
        if self.residual.len() != deltas.len() {
            self.residual.resize(deltas.len(), 0.0);
        }
        for (residual, delta) in self.residual.iter_mut().zip(deltas) {
            let carried = *residual * factor;
            *residual = if delta.is_finite() {
                carried + delta
            } else {
                carried
            };
        }
        self.remaining = self.duration;
    }

    /// Advance by `dt`. Returns `true` while the ramp is still running.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        if self.remaining == 0.0 {
            self.residual.iter_mut().for_each(|r| *r = 0.0);
            return false;
        }
        true
    }

    #[inline]
    fn factor(&self) -> f32 {
        if self.remaining > 0.0 {
            self.remaining / self.duration
        } else {
            0.0
        }
    }

    /// Current offset for routing `index` (0 when idle or out of range).
    #[inline]
    pub fn offset(&self, index: usize) -> f32 {
        self.residual
            .get(index)
            .map_or(0.0, |residual| residual * self.factor())
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
        self.residual.iter_mut().for_each(|r| *r = 0.0);
    }

    pub fn resize(&mut self, len: usize) {
        self.residual.resize(len, 0.0);
    }
}
