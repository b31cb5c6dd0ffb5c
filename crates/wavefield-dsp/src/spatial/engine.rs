//! Spatial calculation engine: composite positions in, routing matrices out.
//!
//! Recalculation is lazy. Parameter changes and position updates mark the
//! affected inputs (or all routings) dirty, and
//! [`SpatialEngine::recalculate_matrix_if_dirty`] recomputes only what is
//! stale before publishing the whole matrix set in one locked copy.
//!
//! Two kinds of change are ramped instead of applied at once: switching an
//! input's delay mode (1 s) and changing its common attenuation percentage
//! (500 ms).

use std::sync::Arc;

use parking_lot::Mutex;
use wavefield_core::coordinates::{angle_between, facing_vector};
use wavefield_core::math::{db_to_gain, gain_to_db};
use wavefield_core::{
    AtomicFlag, ChannelFlags, GlobalParam, InputParam, OutputParam, ParamKey, ParamReader,
    ParameterStore, Position, ResidualRamp, ReverbParam, Vec3, WfsConfig,
};

use super::geometry::{
    directivity_shelf, distance_gain, keystone, AttenuationLaw, DelayMode, Stage,
};
use super::matrix::{MatrixReader, MatrixSet, Routing, RoutingValue};
use crate::error::Result;

/// Ramp time for delay mode switches.
pub const DELAY_MODE_RAMP: f32 = 1.0;

/// Ramp time for common attenuation changes.
pub const COMMON_ATTENUATION_RAMP: f32 = 0.5;

/// Position changes smaller than this do not dirty an input.
const POSITION_EPSILON: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy)]
struct Globals {
    speed_of_sound: f32,
    reference_distance: f32,
    air_absorption: f32,
    stage: Stage,
    floor_height: f32,
    floor_gain: f32,
    floor_hf_db: f32,
}

impl Globals {
    fn read(store: &dyn ParameterStore) -> Self {
        Self {
            speed_of_sound: store.value(GlobalParam::SpeedOfSound.into()),
            reference_distance: store.value(GlobalParam::ReferenceDistance.into()),
            air_absorption: store.value(GlobalParam::AirAbsorption.into()),
            stage: Stage::from_store(store),
            floor_height: store.value(GlobalParam::FloorHeight.into()),
            floor_gain: db_to_gain(store.value(GlobalParam::FloorAttenuation.into())),
            floor_hf_db: store.value(GlobalParam::FloorHfDamping.into()),
        }
    }

    #[inline]
    fn air_loss(&self, distance: f32) -> f32 {
        -self.air_absorption * distance
    }
}

#[derive(Debug, Clone, Copy)]
struct Speaker {
    position: Position,
    listener: Position,
    facing: Vec3,
    angle_on: f32,
    angle_off: f32,
    gain: f32,
    hf_db: f32,
    floor: bool,
}

impl Speaker {
    fn read(store: &dyn ParameterStore, output: usize) -> Self {
        let key = |param| ParamKey::Output(output, param);
        Self {
            position: store.output_position(output),
            listener: store.output_vec(output, OutputParam::LISTENER),
            facing: facing_vector(
                store.value(key(OutputParam::Orientation)),
                store.value(key(OutputParam::Pitch)),
            ),
            angle_on: store.value(key(OutputParam::AngleOn)),
            angle_off: store.value(key(OutputParam::AngleOff)),
            gain: db_to_gain(store.value(key(OutputParam::Attenuation))),
            hf_db: store.value(key(OutputParam::HfDamping)),
            floor: store.flag(key(OutputParam::FloorReflections)),
        }
    }

    /// Keystone gain for sound arriving from `source`.
    #[inline]
    fn coverage(&self, source: Position) -> f32 {
        keystone(
            angle_between(self.facing, self.position - source),
            self.angle_on,
            self.angle_off,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Reverb {
    feed: Speaker,
    return_position: Position,
    return_gain: f32,
    return_delay_ms: f32,
}

impl Reverb {
    fn read(store: &dyn ParameterStore, reverb: usize) -> Self {
        let key = |param| ParamKey::Reverb(reverb, param);
        let position = store.reverb_vec(reverb, ReverbParam::POSITION);
        Self {
            feed: Speaker {
                position,
                listener: position,
                facing: facing_vector(
                    store.value(key(ReverbParam::Orientation)),
                    store.value(key(ReverbParam::Pitch)),
                ),
                angle_on: store.value(key(ReverbParam::AngleOn)),
                angle_off: store.value(key(ReverbParam::AngleOff)),
                gain: db_to_gain(store.value(key(ReverbParam::Attenuation))),
                hf_db: store.value(key(ReverbParam::HfDamping)),
                floor: false,
            },
            return_position: position + store.reverb_vec(reverb, ReverbParam::RETURN_OFFSET),
            return_gain: db_to_gain(store.value(key(ReverbParam::ReturnAttenuation))),
            return_delay_ms: store.value(key(ReverbParam::ReturnDelay)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InputSettings {
    mode: DelayMode,
    delay_trim_ms: f32,
    gain: f32,
    law: AttenuationLaw,
    db_per_decade: f32,
    ratio: f32,
    common_percent: f32,
    facing: Vec3,
    directivity: f32,
    hf_shelf_db: f32,
    reverb_send: f32,
    floor: bool,
}

impl InputSettings {
    fn read(store: &dyn ParameterStore, input: usize, gyrophone_deg: f32) -> Self {
        let key = |param| ParamKey::Input(input, param);
        Self {
            mode: DelayMode::from_flag(store.flag(key(InputParam::MinimalLatency))),
            delay_trim_ms: store.value(key(InputParam::DelayTrim)),
            gain: db_to_gain(store.value(key(InputParam::Attenuation))),
            law: AttenuationLaw::from_index(store.index(key(InputParam::AttenuationLaw))),
            db_per_decade: store.value(key(InputParam::DistanceAttenuation)),
            ratio: store.value(key(InputParam::DistanceRatio)),
            common_percent: store.value(key(InputParam::CommonAttenuation)),
            facing: facing_vector(
                store.value(key(InputParam::Rotation)) + gyrophone_deg,
                store.value(key(InputParam::Tilt)),
            ),
            directivity: store.value(key(InputParam::Directivity)),
            hf_shelf_db: store.value(key(InputParam::HfShelf)),
            reverb_send: db_to_gain(store.value(key(InputParam::ReverbSend))),
            floor: store.flag(key(InputParam::FloorReflections)),
        }
    }

    #[inline]
    fn distance_gain(&self, distance: f32, globals: &Globals) -> f32 {
        distance_gain(
            self.law,
            distance,
            globals.reference_distance,
            self.db_per_decade,
            self.ratio,
        )
    }

    #[inline]
    fn shelf(&self, source: Position, toward: Position) -> f32 {
        directivity_shelf(
            angle_between(self.facing, toward - source),
            self.directivity,
            self.hf_shelf_db,
        )
    }
}

/// Per-input ramp and mode tracking.
#[derive(Debug, Clone)]
struct InputRamps {
    mode: Option<DelayMode>,
    delay: ResidualRamp,
    common_percent: Option<f32>,
    common: ResidualRamp,
}

impl InputRamps {
    fn new(num_outputs: usize) -> Self {
        Self {
            mode: None,
            delay: ResidualRamp::new(num_outputs, DELAY_MODE_RAMP),
            common_percent: None,
            common: ResidualRamp::new(num_outputs, COMMON_ATTENUATION_RAMP),
        }
    }

    fn is_active(&self) -> bool {
        self.delay.is_active() || self.common.is_active()
    }
}

/// Scratch rows reused across recalculations.
#[derive(Debug, Clone, Default)]
struct RowScratch {
    delay_ms: Vec<f32>,
    level_db: Vec<f32>,
    hf_db: Vec<f32>,
    audible: Vec<bool>,
    trim: Vec<f32>,
    deltas: Vec<f32>,
}

impl RowScratch {
    fn resize(&mut self, num_outputs: usize) {
        self.delay_ms.resize(num_outputs, 0.0);
        self.level_db.resize(num_outputs, 0.0);
        self.hf_db.resize(num_outputs, 0.0);
        self.audible.resize(num_outputs, false);
        self.trim.resize(num_outputs, 1.0);
        self.deltas.resize(num_outputs, 0.0);
    }
}

/// Control-rate matrix engine for all four routing families.
pub struct SpatialEngine {
    store: Arc<dyn ParameterStore>,
    num_inputs: usize,
    num_outputs: usize,
    num_reverbs: usize,

    positions: Vec<Position>,
    shared_positions: Arc<Mutex<Vec<Position>>>,
    gyrophone_deg: Vec<f32>,
    tamer_gains: Vec<f32>,

    speakers: Vec<Speaker>,
    reverbs: Vec<Reverb>,
    ramps: Vec<InputRamps>,
    row: RowScratch,

    working: MatrixSet,
    published: Arc<Mutex<MatrixSet>>,

    matrix_dirty: AtomicFlag,
    outputs_dirty: AtomicFlag,
    reverbs_dirty: AtomicFlag,
    input_dirty: ChannelFlags,

    recalculations: u64,
}

impl SpatialEngine {
    pub fn new(store: Arc<dyn ParameterStore>, config: &WfsConfig) -> Result<Self> {
        config.validate()?;

        let inputs = config.num_inputs;
        let outputs = config.num_outputs;
        let reverbs = config.num_reverbs;
        let positions: Vec<Position> = (0..inputs).map(|i| store.input_position(i)).collect();

        let mut row = RowScratch::default();
        row.resize(outputs);

        Ok(Self {
            store,
            num_inputs: inputs,
            num_outputs: outputs,
            num_reverbs: reverbs,
            shared_positions: Arc::new(Mutex::new(positions.clone())),
            positions,
            gyrophone_deg: vec![0.0; inputs],
            tamer_gains: vec![1.0; inputs * outputs],
            speakers: Vec::with_capacity(outputs),
            reverbs: Vec::with_capacity(reverbs),
            ramps: vec![InputRamps::new(outputs); inputs],
            row,
            working: MatrixSet::new(inputs, outputs, reverbs),
            published: Arc::new(Mutex::new(MatrixSet::new(inputs, outputs, reverbs))),
            matrix_dirty: AtomicFlag::new(true),
            outputs_dirty: AtomicFlag::new(true),
            reverbs_dirty: AtomicFlag::new(true),
            input_dirty: ChannelFlags::new(inputs, true),
            recalculations: 0,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn num_reverbs(&self) -> usize {
        self.num_reverbs
    }

    /// Change channel counts. Everything is reallocated and marked dirty.
    pub fn resize(&mut self, num_inputs: usize, num_outputs: usize, num_reverbs: usize) {
        tracing::debug!(
            "Resizing spatial engine to {} inputs, {} outputs, {} reverbs",
            num_inputs,
            num_outputs,
            num_reverbs
        );
        self.num_inputs = num_inputs;
        self.num_outputs = num_outputs;
        self.num_reverbs = num_reverbs;

        let store = self.store.as_ref();
        let len = self.positions.len();
        self.positions.truncate(num_inputs);
        self.positions
            .extend((len..num_inputs).map(|i| store.input_position(i)));
        self.shared_positions.lock().clone_from(&self.positions);

        self.gyrophone_deg.resize(num_inputs, 0.0);
        self.tamer_gains.clear();
        self.tamer_gains.resize(num_inputs * num_outputs, 1.0);
        self.ramps.clear();
        self.ramps.resize(num_inputs, InputRamps::new(num_outputs));
        self.row.resize(num_outputs);

        self.working = MatrixSet::new(num_inputs, num_outputs, num_reverbs);
        *self.published.lock() = MatrixSet::new(num_inputs, num_outputs, num_reverbs);

        self.input_dirty.resize(num_inputs);
        self.mark_all_dirty();
    }

    /// Handle for the audio thread.
    pub fn reader(&self) -> MatrixReader {
        MatrixReader::new(Arc::clone(&self.published), Arc::clone(&self.shared_positions))
    }

    /// Shared composite position cache.
    pub fn positions_handle(&self) -> Arc<Mutex<Vec<Position>>> {
        Arc::clone(&self.shared_positions)
    }

    // Dirty tracking

    pub fn mark_input_dirty(&self, input: usize) {
        if input < self.num_inputs {
            self.input_dirty.mark(input);
            self.matrix_dirty.set(true);
        }
    }

    /// Speaker or listener geometry changed: every routing is stale.
    pub fn mark_outputs_dirty(&self) {
        self.outputs_dirty.set(true);
        self.matrix_dirty.set(true);
    }

    pub fn mark_reverbs_dirty(&self) {
        self.reverbs_dirty.set(true);
        self.matrix_dirty.set(true);
    }

    pub fn mark_all_dirty(&self) {
        self.input_dirty.mark_all();
        self.outputs_dirty.set(true);
        self.reverbs_dirty.set(true);
        self.matrix_dirty.set(true);
    }

    /// Mark whatever a stored parameter change invalidates.
    pub fn on_param_change(&self, key: ParamKey) {
        match key {
            ParamKey::Global(param) if !param.is_binaural() => self.mark_all_dirty(),
            ParamKey::Global(_) => {}
            ParamKey::Input(input, param) if param.affects_routing() => {
                self.mark_input_dirty(input)
            }
            ParamKey::Input(..) => {}
            ParamKey::Output(..) => self.mark_outputs_dirty(),
            ParamKey::Reverb(..) => self.mark_reverbs_dirty(),
        }
    }

    pub fn is_matrix_dirty(&self) -> bool {
        self.matrix_dirty.get()
    }

    pub fn is_input_dirty(&self, input: usize) -> bool {
        self.input_dirty.is_set(input)
    }

    /// Number of recalculation passes performed so far.
    pub fn recalculation_count(&self) -> u64 {
        self.recalculations
    }

    // Inputs from the modulation engines

    /// Push composite input positions. Non-finite positions are ignored.
    pub fn update_input_positions(&mut self, positions: &[Position]) {
        let mut changed = false;
        for (input, (cached, &new)) in self.positions.iter_mut().zip(positions).enumerate() {
            if !new.is_finite() {
                continue;
            }
            if cached.distance_squared(new) > POSITION_EPSILON * POSITION_EPSILON {
                *cached = new;
                self.input_dirty.mark(input);
                changed = true;
            }
        }
        if changed {
            self.matrix_dirty.set(true);
            self.shared_positions.lock().clone_from(&self.positions);
        }
    }

    /// Composite position of an input, `Vec3::ZERO` when out of range.
    pub fn input_position(&self, input: usize) -> Position {
        self.positions.get(input).copied().unwrap_or(Vec3::ZERO)
    }

    /// Gyrophone rotation added to the input's directivity, in degrees.
    pub fn set_gyrophone(&mut self, input: usize, degrees: f32) {
        let Some(current) = self.gyrophone_deg.get_mut(input) else {
            return;
        };
        if degrees.is_finite() && *current != degrees {
            *current = degrees;
            self.mark_input_dirty(input);
        }
    }

    /// Take over the tamer gains for this tick, `input * num_outputs + output`.
    pub fn apply_tamer_gains(&mut self, gains: &[f32]) {
        if self.num_outputs == 0 {
            return;
        }
        let rows = self
            .tamer_gains
            .chunks_mut(self.num_outputs)
            .zip(gains.chunks(self.num_outputs));
        for (input, (current, new)) in rows.enumerate() {
            if current.len() == new.len() && current[..] != new[..] {
                current.copy_from_slice(new);
                self.input_dirty.mark(input);
                self.matrix_dirty.set(true);
            }
        }
    }

    /// Advance the delay mode and common attenuation ramps.
    pub fn advance_ramps(&mut self, dt: f32) {
        for (input, ramps) in self.ramps.iter_mut().enumerate() {
            if ramps.is_active() {
                ramps.delay.advance(dt);
                ramps.common.advance(dt);
                self.input_dirty.mark(input);
                self.matrix_dirty.set(true);
            }
        }
    }

    pub fn is_ramping(&self) -> bool {
        self.ramps.iter().any(InputRamps::is_active)
    }

    // Recalculation

    /// Recompute stale routings and publish. Returns `false` when nothing
    /// was dirty.
    pub fn recalculate_matrix_if_dirty(&mut self) -> bool {
        if !self.matrix_dirty.take() {
            return false;
        }

        let store = Arc::clone(&self.store);
        let store = store.as_ref();
        let globals = Globals::read(store);

        let outputs_dirty = self.outputs_dirty.take();
        let reverbs_dirty = self.reverbs_dirty.take();
        if outputs_dirty {
            self.speakers.clear();
            self.speakers
                .extend((0..self.num_outputs).map(|o| Speaker::read(store, o)));
        }
        if reverbs_dirty {
            self.reverbs.clear();
            self.reverbs
                .extend((0..self.num_reverbs).map(|r| Reverb::read(store, r)));
        }

        let all_inputs = outputs_dirty || reverbs_dirty;
        let mut rows = 0;
        for input in 0..self.num_inputs {
            if all_inputs || self.input_dirty.is_set(input) {
                self.compute_input(store, input, &globals);
                rows += 1;
            }
        }
        self.input_dirty.clear_all();

        if all_inputs {
            self.compute_reverb_returns(&globals);
        }

        self.published.lock().copy_from(&self.working);
        self.recalculations += 1;
        tracing::trace!(
            "Matrix recalculated ({} of {} inputs{})",
            rows,
            self.num_inputs,
            if all_inputs { ", reverb returns" } else { "" }
        );
        true
    }

    fn compute_input(&mut self, store: &dyn ParameterStore, input: usize, globals: &Globals) {
        let settings = InputSettings::read(store, input, self.gyrophone_deg[input]);
        let source = self.positions[input];
        let sideline = globals.stage.sideline_gain(source);
        let c = globals.speed_of_sound;
        let ramps = &mut self.ramps[input];
        let row = &mut self.row;
        let tamer = &self.tamer_gains[input * self.num_outputs..(input + 1) * self.num_outputs];

        // Delay mode switch: fade out the step between the two laws.
        if let Some(previous) = ramps.mode.filter(|&mode| mode != settings.mode) {
            for (delta, speaker) in row.deltas.iter_mut().zip(&self.speakers) {
                *delta = previous.delay_ms(source, speaker.position, speaker.listener, c)
                    - settings.mode.delay_ms(source, speaker.position, speaker.listener, c);
            }
            ramps.delay.start(&row.deltas);
            tracing::debug!("Input {} delay mode {:?} -> {:?}", input, previous, settings.mode);
        }
        ramps.mode = Some(settings.mode);

        // Direct path, before common attenuation.
        let mut common_db = f32::NEG_INFINITY;
        for (output, speaker) in self.speakers.iter().enumerate() {
            let distance = source.distance(speaker.position);
            row.delay_ms[output] = settings
                .mode
                .delay_ms(source, speaker.position, speaker.listener, c)
                + settings.delay_trim_ms
                + ramps.delay.offset(output);

            // Geometry only; trims and the tamer apply after common attenuation.
            let level =
                settings.distance_gain(distance, globals) * speaker.coverage(source) * sideline;
            row.trim[output] = tamer[output] * settings.gain * speaker.gain;
            row.audible[output] = level > 0.0 && level.is_finite();
            row.level_db[output] = gain_to_db(level);
            if row.audible[output] {
                common_db = common_db.max(row.level_db[output]);
            }

            row.hf_db[output] = globals.air_loss(distance)
                + settings.shelf(source, speaker.position)
                + speaker.hf_db;
        }

        // Common attenuation: remove part of the level all speakers share.
        let common_db = if common_db.is_finite() { common_db } else { 0.0 };
        let removed = |percent: f32| common_db * (1.0 - percent / 100.0);
        if let Some(previous) = ramps
            .common_percent
            .filter(|&percent| percent != settings.common_percent)
        {
            let delta = removed(settings.common_percent) - removed(previous);
            row.deltas.iter_mut().for_each(|d| *d = delta);
            ramps.common.start(&row.deltas);
        }
        ramps.common_percent = Some(settings.common_percent);

        let applied = removed(settings.common_percent);
        for output in 0..self.num_outputs {
            let level = if row.audible[output] {
                db_to_gain(row.level_db[output] - applied + ramps.common.offset(output))
                    * row.trim[output]
            } else {
                0.0
            };
            self.working.input_output.set(
                input,
                output,
                RoutingValue {
                    delay_ms: row.delay_ms[output],
                    level,
                    hf_db: row.hf_db[output],
                },
            );
        }

        // Floor reflection: the source mirrored below the floor plane.
        let mirrored = Vec3::new(source.x, source.y, 2.0 * globals.floor_height - source.z);
        for (output, speaker) in self.speakers.iter().enumerate() {
            let value = if settings.floor && speaker.floor {
                let distance = mirrored.distance(speaker.position);
                RoutingValue {
                    delay_ms: settings
                        .mode
                        .delay_ms(mirrored, speaker.position, speaker.listener, c)
                        + settings.delay_trim_ms,
                    level: settings.distance_gain(distance, globals)
                        * speaker.coverage(mirrored)
                        * sideline
                        * tamer[output]
                        * settings.gain
                        * speaker.gain
                        * globals.floor_gain,
                    hf_db: globals.air_loss(distance)
                        + settings.shelf(mirrored, speaker.position)
                        + speaker.hf_db
                        + globals.floor_hf_db,
                }
            } else {
                RoutingValue::SILENT
            };
            self.working.floor.set(input, output, value);
        }

        // Reverb feeds behave like speakers with precedence delays.
        for (index, reverb) in self.reverbs.iter().enumerate() {
            let feed = &reverb.feed;
            let distance = source.distance(feed.position);
            let value = RoutingValue {
                delay_ms: DelayMode::AcousticPrecedence.delay_ms(
                    source,
                    feed.position,
                    feed.listener,
                    c,
                ) + settings.delay_trim_ms,
                level: settings.distance_gain(distance, globals)
                    * feed.coverage(source)
                    * sideline
                    * settings.gain
                    * settings.reverb_send
                    * feed.gain,
                hf_db: globals.air_loss(distance)
                    + settings.shelf(source, feed.position)
                    + feed.hf_db,
            };
            self.working.input_reverb.set(input, index, value);
        }
    }

    fn compute_reverb_returns(&mut self, globals: &Globals) {
        for (index, reverb) in self.reverbs.iter().enumerate() {
            let source = reverb.return_position;
            for (output, speaker) in self.speakers.iter().enumerate() {
                let distance = source.distance(speaker.position);
                let value = RoutingValue {
                    delay_ms: DelayMode::AcousticPrecedence.delay_ms(
                        source,
                        speaker.position,
                        speaker.listener,
                        globals.speed_of_sound,
                    ) + reverb.return_delay_ms,
                    level: distance_gain(
                        AttenuationLaw::InversePower,
                        distance,
                        globals.reference_distance,
                        0.0,
                        1.0,
                    ) * speaker.coverage(source)
                        * speaker.gain
                        * reverb.return_gain,
                    hf_db: globals.air_loss(distance) + speaker.hf_db,
                };
                self.working.reverb_output.set(index, output, value);
            }
        }
    }

    // Control-side reads

    /// Published value for one routing. Locks; not for the audio callback.
    pub fn routing(&self, routing: Routing, row: usize, col: usize) -> RoutingValue {
        self.published.lock().get(routing).get(row, col)
    }

    pub fn delay_ms(&self, input: usize, output: usize) -> f32 {
        self.routing(Routing::InputOutput, input, output).delay_ms
    }

    pub fn level(&self, input: usize, output: usize) -> f32 {
        self.routing(Routing::InputOutput, input, output).level
    }

    pub fn hf_db(&self, input: usize, output: usize) -> f32 {
        self.routing(Routing::InputOutput, input, output).hf_db
    }
}
