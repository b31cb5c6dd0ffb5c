//! Position modulation through the full tick: speed limiter, LFO and
//! programmed motion.

use approx::assert_relative_eq;
use wavefield::prelude::*;

use crate::helpers::*;

fn input(param: InputParam) -> ParamKey {
    ParamKey::Input(0, param)
}

#[test]
fn test_speed_limited_glide() {
    let (mut engine, store) = test_rig(1, 2);
    store.set(input(InputParam::SpeedLimitActive), 1.0);
    store.set(input(InputParam::MaxSpeed), 1.0);
    engine.tick(TICK);

    set_input_position(store.as_ref(), 0, Vec3::new(10.0, 0.0, 0.0));
    let mut previous = engine.composite_position(0);
    for _ in 0..50 {
        engine.tick(TICK);
        let current = engine.composite_position(0);
        assert!(current.distance(previous) <= 1.0 * TICK + FLOAT_EPSILON);
        previous = current;
    }
    assert!(previous.x > 0.9 && previous.x <= 1.0 + POSITION_EPSILON);
    assert!(engine.speed_limiter().is_input_moving(0));

    // Spatial engine sees the limited position, not the stored target.
    assert_eq!(engine.spatial().input_position(0), previous);
}

#[test]
fn test_unlimited_position_jumps() {
    let (mut engine, store) = test_rig(1, 2);
    engine.tick(TICK);
    set_input_position(store.as_ref(), 0, Vec3::new(10.0, 0.0, 0.0));
    engine.tick(TICK);
    assert_eq!(engine.composite_position(0), Vec3::new(10.0, 0.0, 0.0));
}

#[test]
fn test_programmed_motion_commits_destination() {
    let (mut engine, store) = test_rig(1, 2);
    store.set(input(InputParam::MotionDestinationX), 4.0);
    store.set(input(InputParam::MotionDuration), 1.0);
    engine.tick(TICK);

    assert!(engine.start_motion(0));
    assert_eq!(engine.motion_state(0), MotionState::Playing);
    run_ticks(&mut engine, 25);
    assert_relative_eq!(engine.composite_position(0).x, 2.0, epsilon = POSITION_EPSILON);

    let ticks = run_until(&mut engine, 40, |e| e.motion_state(0) == MotionState::Stopped);
    assert!(ticks.is_some());
    assert_relative_eq!(engine.composite_position(0).x, 4.0, epsilon = POSITION_EPSILON);
    assert_relative_eq!(store.input_position(0).x, 4.0, epsilon = POSITION_EPSILON);

    // No glide back after the commit, even with a speed limit.
    store.set(input(InputParam::SpeedLimitActive), 1.0);
    run_ticks(&mut engine, 5);
    assert_relative_eq!(engine.composite_position(0).x, 4.0, epsilon = POSITION_EPSILON);
}

#[test]
fn test_flipped_motion_is_continuous() {
    let (mut engine, store) = test_rig(1, 2);
    set_input_position(store.as_ref(), 0, Vec3::new(1.0, 0.0, 0.0));
    store.set(input(InputParam::FlipX), 1.0);
    store.set(input(InputParam::MotionDestinationX), 4.0);
    store.set(input(InputParam::MotionDuration), 1.0);
    engine.tick(TICK);
    assert_relative_eq!(engine.composite_position(0).x, -1.0, epsilon = FLOAT_EPSILON);

    assert!(engine.start_motion(0));
    let mut previous = engine.composite_position(0);
    let mut max_jump: f32 = 0.0;
    for _ in 0..60 {
        engine.tick(TICK);
        let current = engine.composite_position(0);
        assert!(current.x <= previous.x + FLOAT_EPSILON);
        max_jump = max_jump.max(current.distance(previous));
        previous = current;
    }

    assert_eq!(engine.motion_state(0), MotionState::Stopped);
    assert_relative_eq!(previous.x, -4.0, epsilon = POSITION_EPSILON);
    assert_relative_eq!(store.input_position(0).x, 4.0, epsilon = POSITION_EPSILON);
    assert!(max_jump < 0.5);
}

#[test]
fn test_motion_pause_and_stop() {
    let (mut engine, store) = test_rig(1, 2);
    store.set(input(InputParam::MotionDestinationY), 2.0);
    store.set(input(InputParam::MotionDuration), 1.0);
    engine.tick(TICK);

    assert!(engine.start_motion(0));
    assert!(!engine.start_motion(0));
    run_ticks(&mut engine, 10);
    engine.pause_motion(0);
    let paused_at = engine.composite_position(0);
    run_ticks(&mut engine, 10);
    assert_eq!(engine.composite_position(0), paused_at);

    engine.resume_motion(0);
    run_ticks(&mut engine, 5);
    engine.stop_motion(0);
    engine.tick(TICK);
    let stopped_at = engine.composite_position(0);
    assert_eq!(engine.motion_state(0), MotionState::Stopped);
    assert!(stopped_at.y > paused_at.y && stopped_at.y < 2.0);
    assert_relative_eq!(store.input_position(0).y, stopped_at.y, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_tracking_blocks_motion() {
    let (mut engine, store) = test_rig(1, 2);
    store.set(input(InputParam::TrackingActive), 1.0);
    assert!(!engine.start_motion(0));
}

#[test]
fn test_audio_trigger_hysteresis() {
    let (mut engine, store) = test_rig(1, 2);
    store.set(input(InputParam::MotionTrigger), 1.0);
    store.set(input(InputParam::MotionTriggerThreshold), -20.0);
    store.set(input(InputParam::MotionTriggerReset), -60.0);
    store.set(input(InputParam::MotionDestinationX), 1.0);
    store.set(input(InputParam::MotionDuration), 0.1);
    engine.tick(TICK);
    assert_eq!(engine.motion_state(0), MotionState::Stopped);

    engine.set_input_levels(0, -15.0, -30.0);
    engine.tick(TICK);
    assert_eq!(engine.motion_state(0), MotionState::Playing);

    let done = run_until(&mut engine, 20, |e| e.motion_state(0) == MotionState::Stopped);
    assert!(done.is_some());

    // Loud again before the RMS dropped below the reset level.
    engine.set_input_levels(0, -10.0, -30.0);
    run_ticks(&mut engine, 10);
    assert_eq!(engine.motion_state(0), MotionState::Stopped);
    assert!(!engine.motion().is_trigger_armed(0));

    engine.set_input_levels(0, -70.0, -70.0);
    engine.tick(TICK);
    assert!(engine.motion().is_trigger_armed(0));
    assert_eq!(engine.motion_state(0), MotionState::Stopped);

    engine.set_input_levels(0, -15.0, -30.0);
    engine.tick(TICK);
    assert_eq!(engine.motion_state(0), MotionState::Playing);
}

#[test]
fn test_lfo_offset_is_bounded() {
    let (mut engine, store) = test_rig(1, 2);
    store.set(input(InputParam::LfoActive), 1.0);
    store.set(input(InputParam::LfoShapeX), 1.0);
    store.set(input(InputParam::LfoAmplitudeX), 2.0);
    store.set(input(InputParam::LfoPeriod), 1.0);

    let mut peak: f32 = 0.0;
    for _ in 0..150 {
        engine.tick(TICK);
        let x = engine.composite_position(0).x;
        assert!(x.abs() <= 2.0 + FLOAT_EPSILON);
        assert_eq!(engine.composite_position(0).y, 0.0);
        peak = peak.max(x.abs());
    }
    assert!(peak > 1.5);

    store.set(input(InputParam::LfoActive), 0.0);
    run_ticks(&mut engine, 40);
    assert_relative_eq!(engine.composite_position(0).x, 0.0, epsilon = FLOAT_EPSILON);
}
