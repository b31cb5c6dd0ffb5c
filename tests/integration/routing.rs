//! End-to-end routing tests: store changes in, published matrices out.

use approx::assert_relative_eq;
use wavefield::prelude::*;

use crate::helpers::*;

/// One input at the origin, one speaker 10 m upstage.
fn ten_metre_rig() -> (WfsEngine, std::sync::Arc<dyn ParameterStore>) {
    let (engine, store) = test_rig(1, 1);
    set_output_position(store.as_ref(), 0, Vec3::new(0.0, 10.0, 0.0));
    (engine, store)
}

#[test]
fn test_acoustic_precedence_delay() {
    let (mut engine, _store) = ten_metre_rig();
    engine.tick(TICK);

    let snap = snapshot(&engine.matrix_reader(), Routing::InputOutput);
    assert_relative_eq!(snap.delay(0, 0), 10.0 / 343.0 * 1000.0, epsilon = DELAY_EPSILON_MS);
    assert_relative_eq!(snap.delay(0, 0), 29.15, epsilon = 0.01);
}

#[test]
fn test_minimal_latency_delay() {
    let (mut engine, store) = ten_metre_rig();
    store.set(ParamKey::Output(0, OutputParam::ListenerY), 15.0);
    store.set(ParamKey::Input(0, InputParam::MinimalLatency), 1.0);
    engine.tick(TICK);

    // |listener - source| - |listener - speaker|
    let expected = (15.0 - 5.0) / 343.0 * 1000.0;
    let snap = snapshot(&engine.matrix_reader(), Routing::InputOutput);
    assert_relative_eq!(snap.delay(0, 0), expected, epsilon = DELAY_EPSILON_MS);
}

#[test]
fn test_speed_of_sound_change_reaches_matrix() {
    let (mut engine, store) = ten_metre_rig();
    engine.tick(TICK);
    store.set(GlobalParam::SpeedOfSound.into(), 400.0);
    engine.tick(TICK);
    assert_relative_eq!(engine.spatial().delay_ms(0, 0), 25.0, epsilon = DELAY_EPSILON_MS);
}

#[test]
fn test_recalculation_only_when_dirty() {
    let (mut engine, store) = ten_metre_rig();
    assert!(engine.spatial().is_matrix_dirty());

    engine.tick(TICK);
    let after_first = engine.spatial().recalculation_count();
    assert_eq!(after_first, 1);
    assert!(!engine.spatial().is_matrix_dirty());

    run_ticks(&mut engine, 5);
    assert_eq!(engine.spatial().recalculation_count(), after_first);

    store.set(ParamKey::Input(0, InputParam::Attenuation), -6.0);
    engine.tick(TICK);
    assert_eq!(engine.spatial().recalculation_count(), after_first + 1);
}

#[test]
fn test_modulation_settings_do_not_dirty_matrix() {
    let (mut engine, store) = ten_metre_rig();
    engine.tick(TICK);
    let count = engine.spatial().recalculation_count();

    store.set(ParamKey::Input(0, InputParam::MaxSpeed), 3.0);
    store.set(ParamKey::Input(0, InputParam::LfoPeriod), 2.0);
    store.set(GlobalParam::BinauralTrim.into(), -3.0);
    engine.tick(TICK);
    assert_eq!(engine.spatial().recalculation_count(), count);
}

#[test]
fn test_position_change_moves_delay() {
    let (mut engine, store) = ten_metre_rig();
    engine.tick(TICK);
    set_input_position(store.as_ref(), 0, Vec3::new(0.0, 5.0, 0.0));
    engine.tick(TICK);

    let snap = snapshot(&engine.matrix_reader(), Routing::InputOutput);
    assert_relative_eq!(snap.delay(0, 0), 5.0 / 343.0 * 1000.0, epsilon = DELAY_EPSILON_MS);
}

#[test]
fn test_reader_rejects_short_buffers() {
    let (mut engine, _store) = test_rig(2, 4);
    engine.tick(TICK);
    let reader = engine.matrix_reader();
    let mut short = vec![0.0; 3];
    let mut levels = vec![0.0; 8];
    let mut hf = vec![0.0; 8];
    assert!(reader
        .try_read(Routing::InputOutput, &mut short, &mut levels, &mut hf)
        .is_err());
}

#[test]
fn test_reader_positions_follow_composite() {
    let (mut engine, store) = test_rig(2, 2);
    store.set(ParamKey::Input(1, InputParam::OffsetZ), 2.0);
    engine.tick(TICK);

    let mut positions = [Vec3::ZERO; 4];
    let count = engine
        .matrix_reader()
        .try_read_positions(&mut positions)
        .unwrap();
    assert_eq!(count, 2);
    assert_relative_eq!(positions[1].z, 2.0, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_matrices_stay_finite() {
    let (mut engine, store) = test_rig(2, 3);
    // Source exactly on a speaker.
    set_output_position(store.as_ref(), 1, Vec3::new(1.0, 1.0, 0.0));
    set_input_position(store.as_ref(), 0, Vec3::new(1.0, 1.0, 0.0));
    store.set(GlobalParam::ReferenceDistance.into(), 0.1);
    engine.tick(TICK);

    let snap = snapshot(&engine.matrix_reader(), Routing::InputOutput);
    for value in snap.delay_ms.iter().chain(&snap.level).chain(&snap.hf_db) {
        assert!(value.is_finite());
    }
}
