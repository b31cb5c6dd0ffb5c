//! Error types for wavefield-dsp

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] wavefield_core::Error),

    #[error("Matrix buffer too small: need {needed} values, got {len}")]
    BufferTooSmall { needed: usize, len: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
