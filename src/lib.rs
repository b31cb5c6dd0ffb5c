//! # Wavefield - Wave Field Synthesis control engine
//!
//! Computes, at control rate, the per-routing delay, level and high-frequency
//! attenuation that a WFS renderer applies between every input and every
//! speaker, from the positions and settings held in a shared parameter store.
//!
//! ## Architecture
//!
//! Wavefield is an umbrella crate that coordinates:
//! - **wavefield-core** - coordinates, parameter store, ramps, lock-free flags, config
//! - **wavefield-dsp** - speed limiter, LFO, programmed motion, live source tamer,
//!   spatial and binaural calculation engines
//!
//! ## Quick Start
//!
//! ```
//! use wavefield::prelude::*;
//!
//! let mut engine = WfsEngine::builder()
//!     .inputs(8)
//!     .outputs(64)
//!     .build()?;
//!
//! let store = engine.store().clone();
//! store.set(ParamKey::Input(0, InputParam::PositionY), 4.0);
//!
//! // Call once per control tick (50 Hz nominal).
//! let dt = engine.config().tick_interval();
//! engine.tick(dt);
//!
//! // The audio thread copies matrices out without blocking.
//! let reader = engine.matrix_reader();
//! let (rows, cols) = reader.dimensions(Routing::InputOutput);
//! let mut delays = vec![0.0; rows * cols];
//! let mut levels = vec![0.0; rows * cols];
//! let mut hf = vec![0.0; rows * cols];
//! reader.try_read(Routing::InputOutput, &mut delays, &mut levels, &mut hf)?;
//! # Ok::<(), wavefield::Error>(())
//! ```

/// Re-export of wavefield-core for direct access
pub use wavefield_core as core;

/// Re-export of wavefield-dsp for direct access
pub use wavefield_dsp as dsp;

pub use wavefield_core::{
    GlobalParam, InputParam, MemoryParameterStore, OutputParam, ParamKey, ParamReader,
    ParameterStore, Position, ReverbParam, Vec3, WfsConfig,
};
pub use wavefield_dsp::{
    BinauralOutput, DelayMode, MatrixReader, MotionState, Routing, RoutingValue,
};

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::WfsEngineBuilder;
pub use engine::WfsEngine;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{WfsEngine, WfsEngineBuilder};

    pub use crate::{Error, Result};

    pub use wavefield_core::store::{set_input_position, set_output_position};
    pub use wavefield_core::{
        GlobalParam, InputParam, MemoryParameterStore, OutputParam, ParamKey, ParamReader,
        ParameterStore, Position, ReverbParam, Vec3, WfsConfig,
    };

    pub use wavefield_dsp::{
        BinauralOutput, DelayMode, MatrixReader, MotionState, Routing, RoutingValue,
    };
}
