//! Small numeric helpers shared by the control-rate engines.

/// Gain floor used when converting silence to decibels.
pub const SILENCE_DB: f32 = -120.0;

/// Convert linear amplitude to decibels
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        SILENCE_DB
    } else {
        (20.0 * gain.log10()).max(SILENCE_DB)
    }
}

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    if db <= SILENCE_DB {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Replace NaN/Inf with `fallback`.
///
/// Everything written into a published matrix goes through this.
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Fractional part in [0, 1), also for negative inputs.
#[inline]
pub fn wrap_unit(value: f32) -> f32 {
    let wrapped = value - value.floor();
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
