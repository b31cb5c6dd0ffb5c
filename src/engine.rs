//! WfsEngine that drives every control-rate subsystem once per tick.

use std::sync::Arc;

use arc_swap::ArcSwap;
use wavefield_core::{
    InputParam, ParamKey, ParamReader, ParameterStore, Position, Vec3, WfsConfig,
};
use wavefield_dsp::{
    BinauralEngine, BinauralOutput, InputSpeedLimiter, LfoEngine, LiveSourceTamer, MatrixReader,
    MotionEngine, MotionState, SpatialEngine,
};

use crate::Result;

/// Host control loop for a wave field synthesis rig.
///
/// One [`tick`](WfsEngine::tick) runs the subsystems in a fixed order:
///
/// 1. drain parameter changes and mark the affected routings dirty
/// 2. glide stored positions through the speed limiter
/// 3. advance the LFO
/// 4. advance programmed motion, committing finished moves
/// 5. compose `flip(limited + motion) + offset + lfo` per input and push the
///    result into the spatial engine
/// 6. advance the spatial engine's delay mode and common attenuation ramps
/// 7. run the live source tamer and hand its gains over
/// 8. recalculate and publish the matrices if anything is stale
///
/// The audio thread reads through a [`MatrixReader`] and never blocks the tick.
///
/// # Example
///
/// ```
/// use wavefield::prelude::*;
///
/// let mut engine = WfsEngine::builder().inputs(1).outputs(2).build()?;
/// let store = engine.store().clone();
/// set_output_position(store.as_ref(), 1, Vec3::new(3.0, 0.0, 0.0));
/// set_input_position(store.as_ref(), 0, Vec3::new(0.0, 5.0, 0.0));
///
/// engine.tick(0.02);
/// assert!(engine.spatial().delay_ms(0, 0) > 0.0);
/// # Ok::<(), wavefield::Error>(())
/// ```
pub struct WfsEngine {
    store: Arc<dyn ParameterStore>,
    config: ArcSwap<WfsConfig>,

    limiter: InputSpeedLimiter,
    lfo: LfoEngine,
    motion: MotionEngine,
    tamer: LiveSourceTamer,
    spatial: SpatialEngine,
    binaural: BinauralEngine,

    composite: Vec<Position>,
    ticks: u64,
}

impl WfsEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::WfsEngineBuilder {
        crate::WfsEngineBuilder::default()
    }

    pub(crate) fn new(store: Arc<dyn ParameterStore>, config: WfsConfig) -> Result<Self> {
        config.validate()?;
        let inputs = config.num_inputs;

        let spatial = SpatialEngine::new(Arc::clone(&store), &config)?;
        let binaural = BinauralEngine::new(Arc::clone(&store), spatial.positions_handle());

        tracing::debug!(
            "WFS engine: {} inputs, {} outputs, {} reverbs at {} Hz",
            config.num_inputs,
            config.num_outputs,
            config.num_reverbs,
            config.control_rate_hz
        );

        Ok(Self {
            limiter: InputSpeedLimiter::new(inputs),
            lfo: LfoEngine::new(Arc::clone(&store), inputs),
            motion: MotionEngine::new(Arc::clone(&store), inputs),
            tamer: LiveSourceTamer::new(Arc::clone(&store), inputs, config.num_outputs),
            composite: (0..inputs).map(|i| store.input_position(i)).collect(),
            spatial,
            binaural,
            store,
            config: ArcSwap::from_pointee(config),
            ticks: 0,
        })
    }

    /// The injected parameter store.
    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<WfsConfig> {
        self.config.load_full()
    }

    /// Change channel counts. State of surviving channels is kept where the
    /// subsystems allow it; every routing is recalculated on the next tick.
    pub fn resize(&mut self, config: WfsConfig) -> Result<()> {
        config.validate()?;
        let (inputs, outputs, reverbs) =
            (config.num_inputs, config.num_outputs, config.num_reverbs);

        self.limiter.resize(inputs);
        self.lfo.resize(inputs);
        self.motion.resize(inputs);
        self.tamer.resize(inputs, outputs);
        self.spatial.resize(inputs, outputs, reverbs);

        let store = self.store.as_ref();
        let len = self.composite.len();
        self.composite.truncate(inputs);
        self.composite
            .extend((len..inputs).map(|i| store.input_position(i)));

        self.config.store(Arc::new(config));
        Ok(())
    }

    /// Run one control tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            tracing::warn!("Ignoring tick with invalid dt {}", dt);
            return;
        }

        self.dispatch_changes();

        let store = Arc::clone(&self.store);
        let store = store.as_ref();
        let inputs = self.composite.len();

        for input in 0..inputs {
            self.limiter.set_speed_limit(
                input,
                store.flag(ParamKey::Input(input, InputParam::SpeedLimitActive)),
                store.value(ParamKey::Input(input, InputParam::MaxSpeed)),
            );
            self.limiter
                .set_target_position(input, store.input_position(input));
        }
        self.limiter.process(dt);

        self.lfo.process(dt);

        self.motion.process(dt);
        for (input, position) in self.motion.drain_commits() {
            self.limiter.reset_position(input, position);
        }

        for (input, composite) in self.composite.iter_mut().enumerate() {
            let flip = InputParam::FLIP.map(|axis| store.flag(ParamKey::Input(input, axis)));
            // Motion runs in stored coordinates, so it is mirrored with the base.
            let base = self.limiter.interpolated_position(input) + self.motion.offset(input);
            *composite = flip_axes(base, flip)
                + store.input_vec(input, InputParam::OFFSET)
                + self.lfo.offset(input);
        }
        self.spatial.update_input_positions(&self.composite);
        for input in 0..inputs {
            self.spatial
                .set_gyrophone(input, self.lfo.gyrophone_degrees(input));
        }

        self.spatial.advance_ramps(dt);

        self.tamer.process(dt, &self.composite);
        self.spatial.apply_tamer_gains(self.tamer.gains());

        if self.spatial.recalculate_matrix_if_dirty() {
            tracing::trace!("Matrices republished on tick {}", self.ticks);
        }
        self.ticks += 1;
    }

    fn dispatch_changes(&mut self) {
        let changes = self.store.take_changes();
        if changes.is_empty() {
            return;
        }
        tracing::trace!("Dispatching {} parameter changes", changes.len());

        let mut listener_changed = false;
        for change in &changes {
            self.spatial.on_param_change(change.key);
            listener_changed |= matches!(change.key, ParamKey::Global(_));
        }
        if listener_changed {
            self.binaural.update_listener();
        }
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // Externally supplied readings

    /// Peak and RMS input levels in dB, used by audio-triggered motion.
    pub fn set_input_levels(&mut self, input: usize, peak_db: f32, rms_db: f32) {
        self.motion.set_input_levels(input, peak_db, rms_db);
    }

    /// Linear gain reduction from the input's compressor stages.
    pub fn set_gain_reduction(&mut self, input: usize, peak_gr: f32, slow_gr: f32) {
        self.tamer.set_gain_reduction(input, peak_gr, slow_gr);
    }

    // Programmed motion

    pub fn start_motion(&mut self, input: usize) -> bool {
        self.motion.start_motion(input)
    }

    pub fn stop_motion(&mut self, input: usize) {
        self.motion.stop_motion(input);
    }

    pub fn pause_motion(&mut self, input: usize) {
        self.motion.pause_motion(input);
    }

    pub fn resume_motion(&mut self, input: usize) {
        self.motion.resume_motion(input);
    }

    pub fn motion_state(&self, input: usize) -> MotionState {
        self.motion.state(input)
    }

    // Read-back

    /// Composite position pushed to the spatial engine on the last tick.
    pub fn composite_position(&self, input: usize) -> Position {
        self.composite.get(input).copied().unwrap_or(Vec3::ZERO)
    }

    /// Handle for the audio thread.
    pub fn matrix_reader(&self) -> MatrixReader {
        self.spatial.reader()
    }

    /// Left and right headphone routing for an input.
    pub fn binaural_output(&self, input: usize) -> BinauralOutput {
        self.binaural.calculate(input)
    }

    pub fn spatial(&self) -> &SpatialEngine {
        &self.spatial
    }

    pub fn binaural(&self) -> &BinauralEngine {
        &self.binaural
    }

    pub fn speed_limiter(&self) -> &InputSpeedLimiter {
        &self.limiter
    }

    pub fn lfo(&self) -> &LfoEngine {
        &self.lfo
    }

    pub fn motion(&self) -> &MotionEngine {
        &self.motion
    }

    pub fn tamer(&self) -> &LiveSourceTamer {
        &self.tamer
    }
}

/// Mirror a position about the origin on the flagged axes.
fn flip_axes(position: Position, flip: [bool; 3]) -> Position {
    let sign = |flipped: bool| if flipped { -1.0 } else { 1.0 };
    position * Vec3::new(sign(flip[0]), sign(flip[1]), sign(flip[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wavefield_core::store::set_input_position;

    fn engine(inputs: usize, outputs: usize) -> WfsEngine {
        WfsEngine::builder()
            .inputs(inputs)
            .outputs(outputs)
            .build()
            .unwrap()
    }

    #[test]
    fn test_flip_axes() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(flip_axes(p, [false; 3]), p);
        assert_eq!(flip_axes(p, [true, false, true]), Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut engine = engine(1, 2);
        engine.tick(0.0);
        engine.tick(f32::NAN);
        engine.tick(-0.02);
        assert_eq!(engine.tick_count(), 0);
        engine.tick(0.02);
        assert_eq!(engine.tick_count(), 1);
    }

    #[test]
    fn test_composite_adds_offset_and_flip() {
        let mut engine = engine(1, 2);
        let store = Arc::clone(engine.store());
        set_input_position(store.as_ref(), 0, Vec3::new(2.0, 3.0, 0.0));
        store.set(ParamKey::Input(0, InputParam::FlipX), 1.0);
        store.set(ParamKey::Input(0, InputParam::OffsetY), 1.5);

        engine.tick(0.02);
        let composite = engine.composite_position(0);
        assert_relative_eq!(composite.x, -2.0, epsilon = 1e-6);
        assert_relative_eq!(composite.y, 4.5, epsilon = 1e-6);
        assert_eq!(engine.spatial().input_position(0), composite);
    }

    #[test]
    fn test_resize_keeps_surviving_positions() {
        let mut engine = engine(2, 4);
        let store = Arc::clone(engine.store());
        set_input_position(store.as_ref(), 0, Vec3::new(1.0, 1.0, 0.0));
        engine.tick(0.02);

        engine.resize(WfsConfig::new(3, 8, 1)).unwrap();
        assert_eq!(engine.config().num_inputs, 3);
        assert_eq!(engine.spatial().num_outputs(), 8);
        assert_eq!(engine.composite_position(0), Vec3::new(1.0, 1.0, 0.0));

        engine.tick(0.02);
        assert!(!engine.spatial().is_matrix_dirty());
        assert!(engine.resize(WfsConfig::new(3, 0, 0)).is_err());
        assert_eq!(engine.config().num_outputs, 8);
    }

    #[test]
    fn test_out_of_range_reads_are_neutral() {
        let engine = engine(1, 2);
        assert_eq!(engine.composite_position(9), Vec3::ZERO);
        assert_eq!(engine.motion_state(9), MotionState::Stopped);
        assert_eq!(engine.binaural_output(9), BinauralOutput::SILENT);
    }
}
