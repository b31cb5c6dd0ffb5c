//! Error types for wavefield-core.

use thiserror::Error;

/// Error type for wavefield-core operations.
///
/// Only construction and configuration can fail. Control-rate operations
/// reject bad input silently and fall back to neutral values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid {kind} channel count: {count} (max {max})")]
    InvalidChannelCount {
        kind: &'static str,
        count: usize,
        max: usize,
    },

    #[error("Invalid control rate: {0} Hz. Must be between 1.0 and 1000.0 Hz")]
    InvalidControlRate(f32),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
