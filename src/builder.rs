//! Builder for configuring and constructing a `WfsEngine`.

use std::sync::Arc;

use wavefield_core::{MemoryParameterStore, ParameterStore, WfsConfig};

use crate::{Result, WfsEngine};

/// Channel counts and the control rate are validated on `build()`. Without
/// an explicit store the engine gets a fresh [`MemoryParameterStore`].
///
/// # Example
///
/// ```
/// use wavefield::prelude::*;
///
/// let engine = WfsEngine::builder()
///     .inputs(4)
///     .outputs(32)
///     .build()?;
///
/// assert_eq!(engine.config().num_outputs, 32);
/// # Ok::<(), wavefield::Error>(())
/// ```
#[derive(Default)]
pub struct WfsEngineBuilder {
    config: WfsConfig,
    store: Option<Arc<dyn ParameterStore>>,
}

impl WfsEngineBuilder {
    /// Default: 8
    pub fn inputs(mut self, count: usize) -> Self {
        self.config.num_inputs = count;
        self
    }

    /// Default: 16
    pub fn outputs(mut self, count: usize) -> Self {
        self.config.num_outputs = count;
        self
    }

    /// Default: 0
    pub fn reverbs(mut self, count: usize) -> Self {
        self.config.num_reverbs = count;
        self
    }

    /// Nominal tick rate in Hz. Default: 50
    pub fn control_rate(mut self, hz: f32) -> Self {
        self.config.control_rate_hz = hz;
        self
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: WfsConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing parameter store with the engine.
    pub fn store(mut self, store: Arc<dyn ParameterStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<WfsEngine> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryParameterStore::new()));
        WfsEngine::new(store, self.config)
    }
}
