//! Published routing matrices and the non-blocking reader for the audio side.

use std::sync::Arc;

use parking_lot::Mutex;
use wavefield_core::math::finite_or;
use wavefield_core::Position;

use crate::error::{Error, Result};

/// Delay, gain and HF attenuation for one routing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingValue {
    pub delay_ms: f32,
    /// Linear gain.
    pub level: f32,
    /// High-frequency attenuation in dB, never positive.
    pub hf_db: f32,
}

impl RoutingValue {
    pub const SILENT: RoutingValue = RoutingValue {
        delay_ms: 0.0,
        level: 0.0,
        hf_db: 0.0,
    };

    /// Replace non-finite fields with safe values and clamp to valid ranges.
    #[inline]
    pub fn sanitized(self) -> Self {
        Self {
            delay_ms: finite_or(self.delay_ms, 0.0).max(0.0),
            level: finite_or(self.level, 0.0).max(0.0),
            hf_db: finite_or(self.hf_db, 0.0).min(0.0),
        }
    }
}

/// The four routing families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routing {
    InputOutput,
    InputReverb,
    ReverbOutput,
    /// Floor reflection of each input toward each output.
    FloorReflection,
}

/// One routing family stored as three parallel flat arrays,
/// `row * cols + col`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingMatrix {
    rows: usize,
    cols: usize,
    delay_ms: Vec<f32>,
    level: Vec<f32>,
    hf_db: Vec<f32>,
}

impl RoutingMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        let len = rows * cols;
        Self {
            rows,
            cols,
            delay_ms: vec![0.0; len],
            level: vec![0.0; len],
            hf_db: vec![0.0; len],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite with `other`, reusing the existing allocations.
    pub fn copy_from(&mut self, other: &RoutingMatrix) {
        self.rows = other.rows;
        self.cols = other.cols;
        self.delay_ms.clone_from(&other.delay_ms);
        self.level.clone_from(&other.level);
        self.hf_db.clone_from(&other.hf_db);
    }

    /// Write one routing. Values are sanitized on the way in.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: RoutingValue) {
        if row >= self.rows || col >= self.cols {
            return;
        }
        let value = value.sanitized();
        let index = row * self.cols + col;
        self.delay_ms[index] = value.delay_ms;
        self.level[index] = value.level;
        self.hf_db[index] = value.hf_db;
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> RoutingValue {
        if row >= self.rows || col >= self.cols {
            return RoutingValue::SILENT;
        }
        let index = row * self.cols + col;
        RoutingValue {
            delay_ms: self.delay_ms[index],
            level: self.level[index],
            hf_db: self.hf_db[index],
        }
    }

    pub fn delays(&self) -> &[f32] {
        &self.delay_ms
    }

    pub fn levels(&self) -> &[f32] {
        &self.level
    }

    pub fn hf(&self) -> &[f32] {
        &self.hf_db
    }

    /// Copy into caller-owned buffers without allocating.
    pub fn copy_into(
        &self,
        delay_ms: &mut [f32],
        level: &mut [f32],
        hf_db: &mut [f32],
    ) -> Result<()> {
        let needed = self.len();
        for len in [delay_ms.len(), level.len(), hf_db.len()] {
            if len < needed {
                return Err(Error::BufferTooSmall { needed, len });
            }
        }
        delay_ms[..needed].copy_from_slice(&self.delay_ms);
        level[..needed].copy_from_slice(&self.level);
        hf_db[..needed].copy_from_slice(&self.hf_db);
        Ok(())
    }
}

/// All four routing families, always published together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixSet {
    pub input_output: RoutingMatrix,
    pub input_reverb: RoutingMatrix,
    pub reverb_output: RoutingMatrix,
    pub floor: RoutingMatrix,
}

impl MatrixSet {
    pub fn new(num_inputs: usize, num_outputs: usize, num_reverbs: usize) -> Self {
        Self {
            input_output: RoutingMatrix::new(num_inputs, num_outputs),
            input_reverb: RoutingMatrix::new(num_inputs, num_reverbs),
            reverb_output: RoutingMatrix::new(num_reverbs, num_outputs),
            floor: RoutingMatrix::new(num_inputs, num_outputs),
        }
    }

    pub fn get(&self, routing: Routing) -> &RoutingMatrix {
        match routing {
            Routing::InputOutput => &self.input_output,
            Routing::InputReverb => &self.input_reverb,
            Routing::ReverbOutput => &self.reverb_output,
            Routing::FloorReflection => &self.floor,
        }
    }

    pub fn copy_from(&mut self, other: &MatrixSet) {
        self.input_output.copy_from(&other.input_output);
        self.input_reverb.copy_from(&other.input_reverb);
        self.reverb_output.copy_from(&other.reverb_output);
        self.floor.copy_from(&other.floor);
    }
}

/// Read handle for the audio thread.
///
/// Every read uses `try_lock`: when the control thread is publishing, the
/// read reports `false` and the caller keeps its previous buffers.
#[derive(Clone)]
pub struct MatrixReader {
    matrices: Arc<Mutex<MatrixSet>>,
    positions: Arc<Mutex<Vec<Position>>>,
}

impl MatrixReader {
    pub(crate) fn new(
        matrices: Arc<Mutex<MatrixSet>>,
        positions: Arc<Mutex<Vec<Position>>>,
    ) -> Self {
        Self {
            matrices,
            positions,
        }
    }

    /// Copy one routing family. `Ok(false)` when the matrices are being
    /// published right now.
    pub fn try_read(
        &self,
        routing: Routing,
        delay_ms: &mut [f32],
        level: &mut [f32],
        hf_db: &mut [f32],
    ) -> Result<bool> {
        let Some(matrices) = self.matrices.try_lock() else {
            return Ok(false);
        };
        matrices.get(routing).copy_into(delay_ms, level, hf_db)?;
        Ok(true)
    }

    /// Single routing value, `None` when contended.
    pub fn try_get(&self, routing: Routing, row: usize, col: usize) -> Option<RoutingValue> {
        self.matrices
            .try_lock()
            .map(|matrices| matrices.get(routing).get(row, col))
    }

    /// Copy composite input positions. Returns how many were copied, or
    /// `None` when contended.
    pub fn try_read_positions(&self, out: &mut [Position]) -> Option<usize> {
        let positions = self.positions.try_lock()?;
        let count = positions.len().min(out.len());
        out[..count].copy_from_slice(&positions[..count]);
        Some(count)
    }

    /// (rows, cols) of a routing family. Blocks briefly; not for the audio
    /// callback.
    pub fn dimensions(&self, routing: Routing) -> (usize, usize) {
        let matrices = self.matrices.lock();
        let matrix = matrices.get(routing);
        (matrix.rows(), matrix.cols())
    }
}
