//! Headphone monitoring read-back.

use approx::assert_relative_eq;
use wavefield::prelude::*;

use crate::helpers::*;

#[test]
fn test_binaural_follows_composite_position() {
    let (mut engine, store) = test_rig(1, 2);
    set_input_position(store.as_ref(), 0, Vec3::new(-6.0, 0.0, 0.0));
    engine.tick(TICK);

    let out = engine.binaural_output(0);
    assert!(out.left.level > out.right.level);
    assert!(out.left.delay_ms < out.right.delay_ms);

    set_input_position(store.as_ref(), 0, Vec3::new(6.0, 0.0, 0.0));
    engine.tick(TICK);
    let out = engine.binaural_output(0);
    assert!(out.right.level > out.left.level);
}

#[test]
fn test_listener_parameters_apply_on_tick() {
    let (mut engine, store) = test_rig(1, 2);
    set_input_position(store.as_ref(), 0, Vec3::new(0.0, 0.0, 0.0));
    engine.tick(TICK);
    let before = engine.binaural_output(0);

    store.set(GlobalParam::BinauralDelay.into(), 20.0);
    store.set(GlobalParam::BinauralTrim.into(), -6.0);
    assert_eq!(engine.binaural_output(0), before);

    engine.tick(TICK);
    let after = engine.binaural_output(0);
    assert_relative_eq!(after.left.delay_ms, before.left.delay_ms + 20.0, epsilon = DELAY_EPSILON_MS);
    assert_relative_eq!(
        after.left.level,
        before.left.level * 10f32.powf(-6.0 / 20.0),
        epsilon = GAIN_EPSILON
    );
}
