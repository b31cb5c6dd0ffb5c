//! Spatial rendering: WFS routing matrices and binaural monitoring.

mod geometry;
pub use geometry::{
    directivity_shelf, distance_gain, keystone, AttenuationLaw, DelayMode, Stage, StageShape,
    MIN_DISTANCE,
};

mod matrix;
pub use matrix::{MatrixReader, MatrixSet, Routing, RoutingMatrix, RoutingValue};

mod engine;
pub use engine::{SpatialEngine, COMMON_ATTENUATION_RAMP, DELAY_MODE_RAMP};

mod binaural;
pub use binaural::{BinauralEngine, BinauralOutput};
