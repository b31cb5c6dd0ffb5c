//! Programmed point-to-point motion per input.
//!
//! A motion captures its path when it starts and publishes an offset from the
//! base position it started at. When a motion ends anywhere other than its
//! origin, the end point is written back to the store as the new base
//! position and the offset drops to zero, so the composite position does not
//! jump.
//!
//! Finished base positions are reported through [`MotionEngine::drain_commits`]
//! so the caller can snap its speed limiter instead of gliding.

mod path;
mod state;
mod trigger;

pub use path::{apply_speed_profile, curved_point, shortest_delta, CoordinateMode, MotionPath};
pub use state::{MotionEvent, MotionFsm, MotionRun, MotionState, TransitionResult};
pub use trigger::TriggerGate;

use std::sync::Arc;

use wavefield_core::coordinates::{cartesian_to_cylindrical, cartesian_to_spherical};
use wavefield_core::store::set_input_position;
use wavefield_core::{
    Cylindrical, InputParam, ParamKey, ParamReader, ParameterStore, Position, Spherical, Vec3,
};

pub const MIN_DURATION: f32 = 0.1;
pub const MAX_DURATION: f32 = 3600.0;

#[derive(Debug, Clone, Default)]
struct MotionChannel {
    fsm: MotionFsm,
    run: Option<MotionRun>,
    offset: Vec3,
    progress: f32,
    trigger: TriggerGate,
}

pub struct MotionEngine {
    store: Arc<dyn ParameterStore>,
    channels: Vec<MotionChannel>,
    commits: Vec<(usize, Position)>,
}

impl MotionEngine {
    pub fn new(store: Arc<dyn ParameterStore>, num_inputs: usize) -> Self {
        Self {
            store,
            channels: vec![MotionChannel::default(); num_inputs],
            commits: Vec::new(),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.channels.len()
    }

    pub fn resize(&mut self, num_inputs: usize) {
        self.channels.resize(num_inputs, MotionChannel::default());
        self.commits.retain(|(input, _)| *input < num_inputs);
    }

    fn key(input: usize, param: InputParam) -> ParamKey {
        ParamKey::Input(input, param)
    }

    fn tracking_active(&self, input: usize) -> bool {
        self.store.flag(Self::key(input, InputParam::TrackingActive))
    }

    /// Start the configured motion. Returns `false` when rejected.
    pub fn start_motion(&mut self, input: usize) -> bool {
        self.start(input, false)
    }

    fn start(&mut self, input: usize, audio_triggered: bool) -> bool {
        let Some(state) = self.channels.get(input).map(|ch| ch.fsm.state()) else {
            return false;
        };
        if state != MotionState::Stopped {
            tracing::debug!("Motion start on input {} rejected: {:?}", input, state);
            return false;
        }
        if self.tracking_active(input) {
            tracing::debug!("Motion start on input {} rejected: tracking active", input);
            return false;
        }

        let store = self.store.as_ref();
        let key = |param| Self::key(input, param);
        let base = store.input_position(input);
        let destination = store.input_vec(input, InputParam::MOTION_DESTINATION);
        let mode = CoordinateMode::from_index(store.index(key(InputParam::MotionCoordinateMode)));
        let path = capture_path(
            mode,
            base,
            destination,
            store.flag(key(InputParam::MotionAbsolute)),
            store.value(key(InputParam::MotionCurve)),
        );

        let run = MotionRun {
            path,
            base,
            duration: store
                .value(key(InputParam::MotionDuration))
                .clamp(MIN_DURATION, MAX_DURATION),
            speed_profile: store.value(key(InputParam::MotionSpeedProfile)),
            return_to_origin: store.flag(key(InputParam::MotionReturn)),
            audio_triggered,
            elapsed: 0.0,
        };

        let channel = &mut self.channels[input];
        channel.fsm.transition(MotionEvent::Start);
        channel.run = Some(run);
        channel.offset = Vec3::ZERO;
        channel.progress = 0.0;
        tracing::debug!(
            "Motion started on input {} ({:?}, {:.2}s{})",
            input,
            mode,
            run.duration,
            if audio_triggered { ", audio trigger" } else { "" }
        );
        true
    }

    /// Stop immediately, keeping the source where it currently is.
    pub fn stop_motion(&mut self, input: usize) {
        let Some(channel) = self.channels.get(input) else {
            return;
        };
        if channel.fsm.state() == MotionState::Stopped {
            return;
        }
        let here = channel
            .run
            .as_ref()
            .map(|run| run.base + channel.offset);
        if let Some(position) = here {
            self.commit(input, position);
        }
        self.finish(input, MotionEvent::Stop);
        tracing::debug!("Motion stopped on input {}", input);
    }

    pub fn pause_motion(&mut self, input: usize) {
        if let Some(channel) = self.channels.get_mut(input) {
            if channel.fsm.transition(MotionEvent::Pause) == TransitionResult::None {
                tracing::debug!("Motion pause on input {} ignored", input);
            }
        }
    }

    pub fn resume_motion(&mut self, input: usize) {
        if let Some(channel) = self.channels.get_mut(input) {
            if channel.fsm.transition(MotionEvent::Resume) == TransitionResult::None {
                tracing::debug!("Motion resume on input {} ignored", input);
            }
        }
    }

    /// Short-term peak and RMS readings for the audio trigger.
    pub fn set_input_levels(&mut self, input: usize, peak_db: f32, rms_db: f32) {
        if let Some(channel) = self.channels.get_mut(input) {
            channel.trigger.set_levels(peak_db, rms_db);
        }
    }

    fn commit(&mut self, input: usize, position: Position) {
        set_input_position(self.store.as_ref(), input, position);
        self.commits.push((input, position));
    }

    fn finish(&mut self, input: usize, event: MotionEvent) {
        let channel = &mut self.channels[input];
        channel.fsm.transition(event);
        channel.run = None;
        channel.offset = Vec3::ZERO;
        channel.progress = 0.0;
    }

    /// Advance every input by `dt` seconds.
    pub fn process(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for input in 0..self.channels.len() {
            let tracking = self.tracking_active(input);
            let state = self.channels[input].fsm.state();

            if tracking && state != MotionState::Stopped {
                tracing::debug!("Tracking active on input {}, stopping motion", input);
                self.stop_motion(input);
                continue;
            }

            match state {
                MotionState::Stopped => self.poll_trigger(input, tracking),
                MotionState::Playing | MotionState::Returning => self.advance(input, dt),
                MotionState::Paused => {}
            }
        }
    }

    fn poll_trigger(&mut self, input: usize, tracking: bool) {
        let key = |param| Self::key(input, param);
        if tracking || !self.store.flag(key(InputParam::MotionTrigger)) {
            return;
        }
        let threshold = self.store.value(key(InputParam::MotionTriggerThreshold));
        let reset = self.store.value(key(InputParam::MotionTriggerReset));

        let gate = &mut self.channels[input].trigger;
        gate.update_rearm(reset);
        if gate.try_fire(threshold) {
            tracing::debug!("Audio trigger fired on input {}", input);
            self.start(input, true);
        }
    }

    fn advance(&mut self, input: usize, dt: f32) {
        let channel = &mut self.channels[input];
        let Some(run) = channel.run.as_mut() else {
            return;
        };

        run.elapsed += dt;
        let linear = run.linear_progress();
        let adjusted = apply_speed_profile(linear, run.speed_profile);
        channel.offset = run.path.position(adjusted) - run.base;
        channel.progress = linear;

        if linear < 1.0 {
            return;
        }

        let returning = channel.fsm.state() == MotionState::Returning;
        if run.return_to_origin && run.audio_triggered {
            // Snap home and wait for the trigger to re-arm.
            channel.trigger.disarm();
            self.finish(input, MotionEvent::Finish);
            tracing::debug!("Motion on input {} snapped back to origin", input);
        } else if run.return_to_origin && !returning {
            run.path = run.path.reversed();
            run.elapsed = 0.0;
            channel.fsm.transition(MotionEvent::BeginReturn);
            channel.progress = 0.0;
            tracing::debug!("Motion on input {} returning", input);
        } else if returning {
            self.finish(input, MotionEvent::Finish);
            tracing::debug!("Motion on input {} back at origin", input);
        } else {
            let destination = run.path.destination();
            self.commit(input, destination);
            self.finish(input, MotionEvent::Finish);
            tracing::debug!("Motion on input {} reached destination", input);
        }
    }

    /// Base positions written back to the store since the last drain.
    pub fn drain_commits(&mut self) -> impl Iterator<Item = (usize, Position)> + '_ {
        self.commits.drain(..)
    }

    /// Offset from the base position, `Vec3::ZERO` when idle.
    pub fn offset(&self, input: usize) -> Vec3 {
        self.channels.get(input).map_or(Vec3::ZERO, |ch| ch.offset)
    }

    pub fn state(&self, input: usize) -> MotionState {
        self.channels
            .get(input)
            .map_or(MotionState::Stopped, |ch| ch.fsm.state())
    }

    /// Linear progress of the current leg, 0 when stopped.
    pub fn progress(&self, input: usize) -> f32 {
        self.channels.get(input).map_or(0.0, |ch| ch.progress)
    }

    pub fn is_trigger_armed(&self, input: usize) -> bool {
        self.channels
            .get(input)
            .is_some_and(|ch| ch.trigger.is_armed())
    }

    pub fn is_any_active(&self) -> bool {
        self.channels
            .iter()
            .any(|ch| ch.fsm.state() != MotionState::Stopped)
    }
}

/// Build the path for a motion starting at `base`.
///
/// In polar modes `destination` holds (radius, azimuth, height or
/// elevation). Absolute azimuths take the short way round; relative deltas
/// are added as-is so several turns can be programmed.
pub fn capture_path(
    mode: CoordinateMode,
    base: Position,
    destination: Vec3,
    absolute: bool,
    curve: f32,
) -> MotionPath {
    match mode {
        CoordinateMode::Cartesian => MotionPath::Cartesian {
            start: base,
            target: if absolute { destination } else { base + destination },
            curve,
        },
        CoordinateMode::Cylindrical => {
            let start = cartesian_to_cylindrical(base);
            let target = if absolute {
                Cylindrical {
                    radius: destination.x,
                    azimuth: start.azimuth + shortest_delta(start.azimuth, destination.y),
                    height: destination.z,
                }
            } else {
                Cylindrical {
                    radius: start.radius + destination.x,
                    azimuth: start.azimuth + destination.y,
                    height: start.height + destination.z,
                }
            };
            MotionPath::Cylindrical { start, target }
        }
        CoordinateMode::Spherical => {
            let start = cartesian_to_spherical(base);
            let target = if absolute {
                Spherical {
                    radius: destination.x,
                    azimuth: start.azimuth + shortest_delta(start.azimuth, destination.y),
                    elevation: destination.z,
                }
            } else {
                Spherical {
                    radius: start.radius + destination.x,
                    azimuth: start.azimuth + destination.y,
                    elevation: start.elevation + destination.z,
                }
            };
            MotionPath::Spherical { start, target }
        }
    }
}
