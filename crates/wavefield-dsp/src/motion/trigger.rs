//! Audio-level trigger gate with re-arm hysteresis.

use wavefield_core::math::SILENCE_DB;

/// Fires once when the peak level crosses the threshold, then stays disarmed
/// until the RMS level has dropped below the (lower) reset level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerGate {
    armed: bool,
    peak_db: f32,
    rms_db: f32,
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self {
            armed: true,
            peak_db: SILENCE_DB,
            rms_db: SILENCE_DB,
        }
    }
}

impl TriggerGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest level readings for the input, in dBFS.
    pub fn set_levels(&mut self, peak_db: f32, rms_db: f32) {
        self.peak_db = if peak_db.is_finite() { peak_db } else { SILENCE_DB };
        self.rms_db = if rms_db.is_finite() { rms_db } else { SILENCE_DB };
    }

    /// Returns `true` exactly once per crossing and disarms.
    pub fn try_fire(&mut self, threshold_db: f32) -> bool {
        if self.armed && self.peak_db > threshold_db {
            self.armed = false;
            true
        } else {
            false
        }
    }

    /// Re-arm once the input has gone quiet. Only called while the motion
    /// is idle.
    pub fn update_rearm(&mut self, reset_db: f32) {
        if !self.armed && self.rms_db < reset_db {
            self.armed = true;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn peak_db(&self) -> f32 {
        self.peak_db
    }

    pub fn rms_db(&self) -> f32 {
        self.rms_db
    }
}
