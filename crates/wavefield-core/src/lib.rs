//! Core types for the wavefield WFS control engine.
//!
//! # Primary API
//!
//! - [`ParameterStore`] / [`MemoryParameterStore`]: injected settings store
//! - [`ParamKey`] and the per-scope identifier sets ([`GlobalParam`],
//!   [`InputParam`], [`OutputParam`], [`ReverbParam`])
//! - [`coordinates`]: Cartesian / cylindrical / spherical conversion
//! - [`LinearRamp`], [`ResidualRamp`]: click-free control transitions
//! - [`AtomicFlag`], [`ChannelFlags`]: dirty-state flags shared with the audio thread
//! - [`WfsConfig`]: channel counts and control cadence

#[macro_use]
mod macros;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::WfsConfig;

pub mod coordinates;
pub use coordinates::{Cylindrical, Position, Spherical};

pub mod math;

mod lockfree;
pub use lockfree::{AtomicFlag, ChannelFlags};

pub mod parameter;
pub use parameter::{ParameterRange, ParameterScale};

pub mod params;
pub use params::{GlobalParam, InputParam, OutputParam, ParamKey, ReverbParam};

pub mod store;
pub use store::{MemoryParameterStore, ParamChange, ParamReader, ParameterStore};

pub mod smooth;
pub use smooth::{LinearRamp, ResidualRamp};

pub use glam::Vec3;
