//! Live source tamer gains flowing into the routing matrices.

use approx::assert_relative_eq;
use wavefield::prelude::*;

use crate::helpers::*;

fn rig() -> (WfsEngine, std::sync::Arc<dyn ParameterStore>) {
    let (engine, store) = test_rig(1, 2);
    set_output_position(store.as_ref(), 0, Vec3::new(0.0, 0.0, 0.0));
    set_output_position(store.as_ref(), 1, Vec3::new(20.0, 0.0, 0.0));
    set_input_position(store.as_ref(), 0, Vec3::new(0.0, 2.0, 0.0));
    (engine, store)
}

#[test]
fn test_tamer_ducks_near_speaker_only() {
    let (mut engine, store) = rig();
    engine.tick(TICK);
    let near = engine.spatial().level(0, 0);
    let far = engine.spatial().level(0, 1);
    assert!(near > 0.0);

    store.set(ParamKey::Input(0, InputParam::TamerActive), 1.0);
    store.set(ParamKey::Input(0, InputParam::TamerRadius), 3.0);
    store.set(ParamKey::Input(0, InputParam::TamerAttenuation), -12.0);
    run_ticks(&mut engine, 30);

    let gain = engine.tamer().gain(0, 0);
    assert!(gain < 1.0);
    assert_relative_eq!(engine.spatial().level(0, 0), near * gain, epsilon = GAIN_EPSILON);
    assert_eq!(engine.tamer().gain(0, 1), 1.0);
    assert_relative_eq!(engine.spatial().level(0, 1), far, epsilon = GAIN_EPSILON);
}

#[test]
fn test_tamer_enable_is_ramped() {
    let (mut engine, store) = rig();
    engine.tick(TICK);
    store.set(ParamKey::Input(0, InputParam::TamerActive), 1.0);

    engine.tick(TICK);
    let early = engine.tamer().gain(0, 0);
    run_ticks(&mut engine, 30);
    let settled = engine.tamer().gain(0, 0);
    assert!(early < 1.0);
    assert!(settled < early);
}

#[test]
fn test_compressor_gain_reduction_deepens_ducking() {
    let (mut engine, store) = rig();
    store.set(ParamKey::Input(0, InputParam::TamerActive), 1.0);
    run_ticks(&mut engine, 30);
    let plain = engine.tamer().gain(0, 0);

    engine.set_gain_reduction(0, 0.5, 1.0);
    engine.tick(TICK);
    assert!(engine.tamer().gain(0, 0) < plain);
}

#[test]
fn test_bypassed_speaker_is_untouched() {
    let (mut engine, store) = rig();
    store.set(ParamKey::Output(0, OutputParam::TamerBypass), 1.0);
    store.set(ParamKey::Input(0, InputParam::TamerActive), 1.0);
    run_ticks(&mut engine, 30);
    assert_eq!(engine.tamer().gain(0, 0), 1.0);
}
