//! Parallel runtime ordering around the engine lifecycle.

use bmi_adapter::{Adapter, AdapterError, LifecycleState, RuntimeError};
use bmi_core::Communicator;
use bmi_test_utils::{private_slot, CountingRuntime, MockEngine, MOCK_NAMELIST};

fn with_runtime(engine: MockEngine, runtime: CountingRuntime) -> Adapter {
    Adapter::builder(Box::new(engine))
        .runtime(Box::new(runtime))
        .slot(private_slot())
        .build()
        .unwrap()
}

#[test]
fn default_runtime_follows_engine_requirement() {
    let serial = Adapter::builder(Box::new(MockEngine::new()))
        .slot(private_slot())
        .build()
        .unwrap();
    assert_eq!(serial.runtime_name(), "serial");
    let parallel = Adapter::builder(Box::new(MockEngine::new().parallel()))
        .slot(private_slot())
        .build()
        .unwrap();
    // Building must not load or start anything.
    assert_eq!(parallel.runtime_name(), "mpi");
    assert_eq!(parallel.state(), LifecycleState::Unregistered);
}

#[test]
fn runtime_boots_before_engine_and_tears_down_once() {
    let engine = MockEngine::new().parallel();
    let log = engine.log();
    let runtime = CountingRuntime::new();
    let counts = runtime.counts();
    let mut a = with_runtime(engine, runtime);

    a.register().unwrap();
    assert_eq!(counts.boots(), 0);
    a.initialize(MOCK_NAMELIST).unwrap();
    assert_eq!(counts.boots(), 1);
    assert_eq!(log.snapshot().communicator, Some(CountingRuntime::WORLD));
    assert_eq!(a.communicator(), Some(CountingRuntime::WORLD));

    a.update().unwrap();
    a.finalize().unwrap();
    assert_eq!(counts.teardowns(), 1);
    assert_eq!(a.finalize(), Err(AdapterError::AlreadyFinalized));
    assert_eq!(counts.teardowns(), 1);
}

#[test]
fn caller_communicator_overrides_runtime_default() {
    let engine = MockEngine::new().parallel();
    let log = engine.log();
    let mut a = with_runtime(engine, CountingRuntime::new());
    a.register().unwrap();
    a.set_communicator(Communicator(-7)).unwrap();
    a.initialize(MOCK_NAMELIST).unwrap();
    assert_eq!(log.snapshot().communicator, Some(Communicator(-7)));
}

#[test]
fn bootstrap_failure_skips_engine_init() {
    let engine = MockEngine::new().parallel();
    let log = engine.log();
    let runtime = CountingRuntime::new().failing_bootstrap();
    let counts = runtime.counts();
    let mut a = with_runtime(engine, runtime);
    a.register().unwrap();
    assert_eq!(
        a.initialize(MOCK_NAMELIST),
        Err(AdapterError::Runtime(RuntimeError::CallFailed {
            function: "MPI_Init",
            code: 16
        }))
    );
    assert_eq!(a.state(), LifecycleState::Registered);
    assert_eq!(log.snapshot().init, 0);

    a.finalize().unwrap();
    assert_eq!(counts.teardowns(), 0);
    assert_eq!(log.snapshot().finalize, 0);
}

#[test]
fn retry_after_engine_init_failure_reuses_runtime() {
    let engine = MockEngine::new().parallel().failing_init();
    let runtime = CountingRuntime::new();
    let counts = runtime.counts();
    let mut a = with_runtime(engine, runtime);
    a.register().unwrap();
    assert!(a.initialize(MOCK_NAMELIST).is_err());
    assert!(a.initialize(MOCK_NAMELIST).is_err());
    assert_eq!(counts.boots(), 1);
    a.finalize().unwrap();
    assert_eq!(counts.teardowns(), 1);
}

#[test]
fn runtime_finalized_elsewhere_is_tolerated() {
    let runtime = CountingRuntime::new().finalized_elsewhere();
    let counts = runtime.counts();
    let mut a = with_runtime(MockEngine::new().parallel(), runtime);
    a.register().unwrap();
    a.initialize(MOCK_NAMELIST).unwrap();
    assert_eq!(a.finalize(), Ok(()));
    assert_eq!(counts.teardowns(), 1);
}

#[test]
fn engine_finalize_failure_still_tears_runtime_down() {
    let runtime = CountingRuntime::new();
    let counts = runtime.counts();
    let mut a = with_runtime(MockEngine::new().parallel().failing_finalize(), runtime);
    a.register().unwrap();
    a.initialize(MOCK_NAMELIST).unwrap();
    assert!(matches!(a.finalize(), Err(AdapterError::Engine(_))));
    assert_eq!(counts.teardowns(), 1);
    assert_eq!(a.state(), LifecycleState::Finalized);
}
