//! Tolerance constants for control-rate testing.

/// Floating point rounding errors (exact geometry, unity gains).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Positions accumulated over many ticks.
pub const POSITION_EPSILON: f32 = 1e-3;

/// Delays in milliseconds.
pub const DELAY_EPSILON_MS: f32 = 1e-3;

/// Linear gains after dB round trips.
pub const GAIN_EPSILON: f32 = 1e-4;
