//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const MAX_INPUTS: usize = 512;
pub const MAX_OUTPUTS: usize = 512;
pub const MAX_REVERBS: usize = 64;

/// Channel counts and control cadence for the WFS engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WfsConfig {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_reverbs: usize,
    /// Nominal control tick rate. Engines accept any `dt`; this only sets
    /// the default step used by [`WfsConfig::tick_interval`].
    pub control_rate_hz: f32,
}

impl Default for WfsConfig {
    fn default() -> Self {
        Self {
            num_inputs: 8,
            num_outputs: 16,
            num_reverbs: 0,
            control_rate_hz: 50.0,
        }
    }
}

impl WfsConfig {
    pub fn new(num_inputs: usize, num_outputs: usize, num_reverbs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            num_reverbs,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_inputs > MAX_INPUTS {
            return Err(Error::InvalidChannelCount {
                kind: "input",
                count: self.num_inputs,
                max: MAX_INPUTS,
            });
        }
        if self.num_outputs == 0 || self.num_outputs > MAX_OUTPUTS {
            return Err(Error::InvalidChannelCount {
                kind: "output",
                count: self.num_outputs,
                max: MAX_OUTPUTS,
            });
        }
        if self.num_reverbs > MAX_REVERBS {
            return Err(Error::InvalidChannelCount {
                kind: "reverb",
                count: self.num_reverbs,
                max: MAX_REVERBS,
            });
        }
        if !(1.0..=1000.0).contains(&self.control_rate_hz) {
            return Err(Error::InvalidControlRate(self.control_rate_hz));
        }
        Ok(())
    }

    /// Seconds between control ticks at the nominal rate.
    #[inline]
    pub fn tick_interval(&self) -> f32 {
        1.0 / self.control_rate_hz
    }
}
