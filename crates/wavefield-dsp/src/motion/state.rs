//! Programmed motion state machine.

use super::path::MotionPath;
use wavefield_core::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Returning,
}

impl MotionState {
    /// Playing or returning; the offset advances each tick.
    pub fn is_running(&self) -> bool {
        matches!(self, MotionState::Playing | MotionState::Returning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    Start,
    Stop,
    Pause,
    Resume,
    /// Outbound leg done with return enabled.
    BeginReturn,
    /// Last leg done.
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    Changed(MotionState),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionFsm {
    state: MotionState,
    paused_from: MotionState,
}

impl MotionFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn transition(&mut self, event: MotionEvent) -> TransitionResult {
        use MotionEvent::*;

        let next = match (event, self.state) {
            (Start, MotionState::Stopped) => MotionState::Playing,
            (Stop, state) if state != MotionState::Stopped => MotionState::Stopped,
            (Pause, state @ (MotionState::Playing | MotionState::Returning)) => {
                self.paused_from = state;
                MotionState::Paused
            }
            (Resume, MotionState::Paused) => self.paused_from,
            (BeginReturn, MotionState::Playing) => MotionState::Returning,
            (Finish, MotionState::Playing | MotionState::Returning) => MotionState::Stopped,
            _ => return TransitionResult::None,
        };

        self.state = next;
        TransitionResult::Changed(next)
    }
}

/// Everything captured when a motion starts.
///
/// Settings changed in the store while a motion runs take effect on the
/// next start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRun {
    pub path: MotionPath,
    /// Base position at start; the published offset is relative to it.
    pub base: Position,
    pub duration: f32,
    pub speed_profile: f32,
    pub return_to_origin: bool,
    pub audio_triggered: bool,
    pub elapsed: f32,
}

impl MotionRun {
    /// Elapsed fraction of the current leg in [0, 1].
    pub fn linear_progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}
