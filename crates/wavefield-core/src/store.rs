//! Injected parameter store interface.
//!
//! The engines never own their settings. They read them by [`ParamKey`] from
//! a shared [`ParameterStore`] and are told about changes through
//! [`ParamChange`] events that the host drains once per tick.
//!
//! # Example
//!
//! ```
//! use wavefield_core::{InputParam, MemoryParameterStore, ParamKey, ParamReader, ParameterStore};
//!
//! let store = MemoryParameterStore::new();
//! store.set(ParamKey::Input(0, InputParam::PositionX), 2.5);
//!
//! assert_eq!(store.value(ParamKey::Input(0, InputParam::PositionX)), 2.5);
//! // Unset keys read their default.
//! assert_eq!(store.value(ParamKey::Input(0, InputParam::MaxSpeed)), 1.0);
//!
//! let changes = store.take_changes();
//! assert_eq!(changes.len(), 1);
//! ```

use crate::params::{InputParam, OutputParam, ParamKey, ReverbParam};
use crate::Position;
use glam::Vec3;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

/// One parameter change, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub key: ParamKey,
    pub value: f32,
}

/// Hierarchical key-value store shared by the host and the engines.
pub trait ParameterStore: Send + Sync {
    /// Raw stored value, `None` when never set.
    fn get(&self, key: ParamKey) -> Option<f32>;

    /// Store a value. Implementations record a [`ParamChange`] when the value
    /// actually changes.
    fn set(&self, key: ParamKey, value: f32);

    /// Drain pending change events.
    fn take_changes(&self) -> Vec<ParamChange>;
}

/// Typed reads with range clamping and default fallback.
pub trait ParamReader {
    /// Clamped value, or the parameter's default when unset.
    fn value(&self, key: ParamKey) -> f32;

    fn flag(&self, key: ParamKey) -> bool {
        self.value(key) >= 0.5
    }

    /// Enumeration index (negative values read as 0).
    fn index(&self, key: ParamKey) -> usize {
        self.value(key).max(0.0) as usize
    }

    fn input_vec(&self, input: usize, axes: [InputParam; 3]) -> Vec3 {
        Vec3::new(
            self.value(ParamKey::Input(input, axes[0])),
            self.value(ParamKey::Input(input, axes[1])),
            self.value(ParamKey::Input(input, axes[2])),
        )
    }

    fn output_vec(&self, output: usize, axes: [OutputParam; 3]) -> Vec3 {
        Vec3::new(
            self.value(ParamKey::Output(output, axes[0])),
            self.value(ParamKey::Output(output, axes[1])),
            self.value(ParamKey::Output(output, axes[2])),
        )
    }

    fn reverb_vec(&self, reverb: usize, axes: [ReverbParam; 3]) -> Vec3 {
        Vec3::new(
            self.value(ParamKey::Reverb(reverb, axes[0])),
            self.value(ParamKey::Reverb(reverb, axes[1])),
            self.value(ParamKey::Reverb(reverb, axes[2])),
        )
    }

    fn input_position(&self, input: usize) -> Position {
        self.input_vec(input, InputParam::POSITION)
    }

    fn output_position(&self, output: usize) -> Position {
        self.output_vec(output, OutputParam::POSITION)
    }
}

impl<S: ParameterStore + ?Sized> ParamReader for S {
    #[inline]
    fn value(&self, key: ParamKey) -> f32 {
        let range = key.range();
        self.get(key).map_or(range.default, |v| range.clamp(v))
    }
}

/// Write a position into the three input position parameters.
pub fn set_input_position<S: ParameterStore + ?Sized>(store: &S, input: usize, position: Position) {
    for (axis, value) in InputParam::POSITION.into_iter().zip(position.to_array()) {
        store.set(ParamKey::Input(input, axis), value);
    }
}

/// Write a position into the three output position parameters.
pub fn set_output_position<S: ParameterStore + ?Sized>(
    store: &S,
    output: usize,
    position: Position,
) {
    for (axis, value) in OutputParam::POSITION.into_iter().zip(position.to_array()) {
        store.set(ParamKey::Output(output, axis), value);
    }
}

/// In-memory [`ParameterStore`].
///
/// Values live in a read-mostly map; changes are queued until drained.
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: RwLock<HashMap<ParamKey, f32>>,
    changes: Mutex<Vec<ParamChange>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of explicitly set keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Remove every key scoped to a channel index at or above the new count.
    pub fn truncate_channels(&self, inputs: usize, outputs: usize, reverbs: usize) {
        self.values.write().retain(|key, _| match *key {
            ParamKey::Global(_) => true,
            ParamKey::Input(i, _) => i < inputs,
            ParamKey::Output(o, _) => o < outputs,
            ParamKey::Reverb(r, _) => r < reverbs,
        });
    }
}

impl ParameterStore for MemoryParameterStore {
    fn get(&self, key: ParamKey) -> Option<f32> {
        self.values.read().get(&key).copied()
    }

    fn set(&self, key: ParamKey, value: f32) {
        if !value.is_finite() {
            tracing::warn!("Ignoring non-finite value for {:?}", key);
            return;
        }
        let previous = self.values.write().insert(key, value);
        if previous != Some(value) {
            self.changes.lock().push(ParamChange { key, value });
        }
    }

    fn take_changes(&self) -> Vec<ParamChange> {
        core::mem::take(&mut *self.changes.lock())
    }
}
