//! Control-rate engines for wave field synthesis: speed limiting, LFO,
//! programmed motion, live source taming, and the spatial and binaural
//! routing calculators. Audio-thread readers take published matrices through
//! [`MatrixReader`] without blocking the control tick.

mod error;
pub use error::{Error, Result};

mod speed_limiter;
pub use speed_limiter::{InputSpeedLimiter, SNAP_DISTANCE};

mod lfo;
pub use lfo::{LfoEngine, LfoWaveform, FADE_TIME};

pub mod motion;
pub use motion::{MotionEngine, MotionState};

mod tamer;
pub use tamer::{LiveSourceTamer, TamerShape, ENABLE_RAMP_TIME};

pub mod spatial;
pub use spatial::{
    BinauralEngine, BinauralOutput, DelayMode, MatrixReader, Routing, RoutingValue, SpatialEngine,
};
