//! Test helpers and fixtures for wavefield integration tests.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): exact geometry
//! - `POSITION_EPSILON` (1e-3): positions integrated over many ticks
//! - `DELAY_EPSILON_MS` (1e-3): matrix delays
//! - `GAIN_EPSILON` (1e-4): linear gains

#![allow(dead_code)]

pub mod tolerances;

use std::sync::Arc;
use wavefield::prelude::*;

pub use tolerances::*;

/// Nominal 50 Hz control tick.
pub const TICK: f32 = 0.02;

/// Route engine logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Engine with a fresh in-memory store.
pub fn test_engine(inputs: usize, outputs: usize) -> WfsEngine {
    init_tracing();
    WfsEngine::builder()
        .inputs(inputs)
        .outputs(outputs)
        .build()
        .expect("Failed to create test engine")
}

/// Engine plus a handle on its store.
pub fn test_rig(inputs: usize, outputs: usize) -> (WfsEngine, Arc<dyn ParameterStore>) {
    let engine = test_engine(inputs, outputs);
    let store = Arc::clone(engine.store());
    (engine, store)
}

pub fn run_ticks(engine: &mut WfsEngine, count: usize) {
    for _ in 0..count {
        engine.tick(TICK);
    }
}

/// Tick until `done` holds, returning the number of ticks taken.
pub fn run_until(
    engine: &mut WfsEngine,
    max_ticks: usize,
    mut done: impl FnMut(&WfsEngine) -> bool,
) -> Option<usize> {
    for tick in 0..max_ticks {
        if done(engine) {
            return Some(tick);
        }
        engine.tick(TICK);
    }
    done(engine).then_some(max_ticks)
}

/// Matrices copied out the way the audio thread would.
pub struct MatrixSnapshot {
    pub cols: usize,
    pub delay_ms: Vec<f32>,
    pub level: Vec<f32>,
    pub hf_db: Vec<f32>,
}

impl MatrixSnapshot {
    pub fn delay(&self, row: usize, col: usize) -> f32 {
        self.delay_ms[row * self.cols + col]
    }

    pub fn level(&self, row: usize, col: usize) -> f32 {
        self.level[row * self.cols + col]
    }
}

pub fn snapshot(reader: &MatrixReader, routing: Routing) -> MatrixSnapshot {
    let (rows, cols) = reader.dimensions(routing);
    let mut snap = MatrixSnapshot {
        cols,
        delay_ms: vec![0.0; rows * cols],
        level: vec![0.0; rows * cols],
        hf_db: vec![0.0; rows * cols],
    };
    let read = reader
        .try_read(routing, &mut snap.delay_ms, &mut snap.level, &mut snap.hf_db)
        .expect("Buffers sized from dimensions");
    assert!(read, "Matrix lock contended in a single-threaded test");
    snap
}
