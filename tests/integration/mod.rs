//! Integration test modules for wavefield

pub mod binaural;
pub mod engine;
pub mod motion;
pub mod routing;
pub mod tamer;
