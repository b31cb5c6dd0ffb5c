//! Parameter ranges: limits, defaults and quantization for stored values.
//!
//! Every value in the parameter store is a plain `f32`. Booleans are stored as
//! 0/1 and enumerations as their index, so the range also says how to read the
//! raw number back.
//!
//! # Example
//!
//! ```
//! use wavefield_core::ParameterRange;
//!
//! let duration = ParameterRange::linear(0.1, 3600.0, 5.0);
//! assert_eq!(duration.clamp(0.0), 0.1);
//!
//! let shape = ParameterRange::integer(0, 8, 0);
//! assert_eq!(shape.clamp(2.6), 3.0);
//! ```

/// How a raw stored value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterScale {
    /// Continuous value.
    #[default]
    Linear,

    /// On/off. Anything at or above the midpoint reads as on.
    Toggle,

    /// Discrete integer steps (enumeration indices, signs).
    Integer,
}

/// Valid range, default and scale for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub scale: ParameterScale,
}

impl ParameterRange {
    pub fn new(min: f32, max: f32, default: f32, scale: ParameterScale) -> Self {
        debug_assert!(max >= min, "max must not be below min");

        Self {
            min,
            max,
            default: default.clamp(min, max),
            scale,
        }
    }

    pub fn linear(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, ParameterScale::Linear)
    }

    /// Angle in degrees within one turn.
    pub fn angle(default: f32) -> Self {
        Self::linear(-180.0, 180.0, default)
    }

    pub fn toggle(default_on: bool) -> Self {
        Self::new(
            0.0,
            1.0,
            if default_on { 1.0 } else { 0.0 },
            ParameterScale::Toggle,
        )
    }

    pub fn integer(min: i32, max: i32, default: i32) -> Self {
        Self::new(
            min as f32,
            max as f32,
            default as f32,
            ParameterScale::Integer,
        )
    }

    /// Clamp to range and snap to the scale's steps.
    ///
    /// Non-finite input yields the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default;
        }
        let value = value.clamp(self.min, self.max);
        match self.scale {
            ParameterScale::Linear => value,
            ParameterScale::Toggle => {
                if value >= (self.min + self.max) * 0.5 {
                    self.max
                } else {
                    self.min
                }
            }
            ParameterScale::Integer => value.round(),
        }
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

impl Default for ParameterRange {
    fn default() -> Self {
        Self::linear(0.0, 1.0, 0.0)
    }
}
