//! Engine lifecycle integration tests

use std::sync::Arc;

use wavefield::prelude::*;

use crate::helpers::*;

#[test]
fn test_builder_configures_counts() {
    let engine = WfsEngine::builder()
        .inputs(4)
        .outputs(24)
        .reverbs(2)
        .control_rate(100.0)
        .build()
        .unwrap();

    let config = engine.config();
    assert_eq!(config.num_inputs, 4);
    assert_eq!(config.num_outputs, 24);
    assert_eq!(config.num_reverbs, 2);
    assert_eq!(config.tick_interval(), 0.01);

    let reader = engine.matrix_reader();
    assert_eq!(reader.dimensions(Routing::InputOutput), (4, 24));
    assert_eq!(reader.dimensions(Routing::InputReverb), (4, 2));
    assert_eq!(reader.dimensions(Routing::ReverbOutput), (2, 24));
}

#[test]
fn test_builder_rejects_bad_config() {
    assert!(WfsEngine::builder().outputs(0).build().is_err());
    assert!(WfsEngine::builder().inputs(10_000).build().is_err());
    assert!(WfsEngine::builder().control_rate(5000.0).build().is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let config = WfsConfig::new(16, 64, 4);
    let json = serde_json::to_string(&config).unwrap();
    let parsed: WfsConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let engine = WfsEngine::builder().config(parsed).build().unwrap();
    assert_eq!(*engine.config(), config);
}

#[test]
fn test_shared_store_is_read_at_construction() {
    let store: Arc<dyn ParameterStore> = Arc::new(MemoryParameterStore::new());
    set_input_position(store.as_ref(), 0, Vec3::new(1.0, 2.0, 0.0));

    let engine = WfsEngine::builder()
        .inputs(1)
        .outputs(2)
        .store(Arc::clone(&store))
        .build()
        .unwrap();
    assert_eq!(engine.composite_position(0), Vec3::new(1.0, 2.0, 0.0));
    assert!(engine.spatial().is_matrix_dirty());
}

#[test]
fn test_resize_grows_and_shrinks() {
    let (mut engine, store) = test_rig(2, 4);
    run_ticks(&mut engine, 2);

    engine.resize(WfsConfig::new(6, 8, 1)).unwrap();
    set_input_position(store.as_ref(), 5, Vec3::new(0.0, 3.0, 0.0));
    run_ticks(&mut engine, 1);
    assert_eq!(
        engine.matrix_reader().dimensions(Routing::InputOutput),
        (6, 8)
    );
    assert_eq!(engine.composite_position(5), Vec3::new(0.0, 3.0, 0.0));

    engine.resize(WfsConfig::new(1, 2, 0)).unwrap();
    run_ticks(&mut engine, 1);
    assert_eq!(
        engine.matrix_reader().dimensions(Routing::InputOutput),
        (1, 2)
    );
    assert_eq!(engine.composite_position(5), Vec3::ZERO);
}

#[test]
fn test_tick_counter() {
    let mut engine = test_engine(1, 1);
    run_ticks(&mut engine, 10);
    assert_eq!(engine.tick_count(), 10);
}
