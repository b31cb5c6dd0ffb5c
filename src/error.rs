//! Centralized error type for the wavefield umbrella crate.
//!
//! Wraps the subsystem errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] wavefield_core::Error),

    #[error("DSP: {0}")]
    Dsp(#[from] wavefield_dsp::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
