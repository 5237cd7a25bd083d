//! Test utilities and mock types for BMI adapter development.
//!
//! Provides a configurable [`MockEngine`] that records every call into a
//! shared [`CallLog`], a [`CountingRuntime`] standing in for MPI, and
//! [`private_slot`] for tests that must not contend for the process-wide
//! engine slot.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{hydro_namelist, TempConfig, MOCK_NAMELIST};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bmi_adapter::{EngineSlot, ParallelRuntime, RuntimeError};
use bmi_catalog::{Grid, Mesh};
use bmi_core::{
    Communicator, EngineError, GridId, InitConfig, Layout, NativeArray, NativeArrayMut,
    NativeData, NativeDataMut, ValueType, VariableDef,
};
use bmi_engine::{ClockSpec, Domain, Engine, InitContext, RuntimeRequirement};

/// A fresh engine slot, so a test's adapters only contend with each other.
pub fn private_slot() -> &'static EngineSlot {
    EngineSlot::leaked()
}

// ── CallLog ────────────────────────────────────────────────────────

/// What a [`MockEngine`] has been asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Calls {
    pub init: usize,
    pub step: usize,
    pub finalize: usize,
    pub reads: usize,
    pub writes: usize,
    /// Communicator passed to the last `initialize`.
    pub communicator: Option<Communicator>,
    /// Configuration keys seen by the last `initialize`.
    pub config_keys: Vec<String>,
}

/// Shared handle on a [`MockEngine`]'s call record.
///
/// Clone it before boxing the engine; the clone keeps observing.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    inner: Arc<Mutex<Calls>>,
}

impl CallLog {
    pub fn snapshot(&self) -> Calls {
        self.inner.lock().unwrap().clone()
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.inner.lock().unwrap());
    }
}

// ── MockEngine ─────────────────────────────────────────────────────

pub const TEMPERATURE: &str = "sea_water__temperature";
pub const SALINITY: &str = "sea_water__salinity";
pub const RAINFALL: &str = "atmosphere_water__rainfall_volume_flux";
pub const NODE_ID: &str = "model__node_id";
pub const ELEVATION: &str = "sea_surface__elevation";
pub const COMM: &str = "bmi_mpi_comm_handle";

/// Land grid: rectilinear `[3, 4]`.
pub const GRID_LAND: GridId = GridId(0);
/// Mesh grid: 5 nodes, 4 edges, 2 faces.
pub const GRID_MESH: GridId = GridId(1);
/// Scalar grid carrying the communicator.
pub const GRID_SCALAR: GridId = GridId(2);
/// Three stations.
pub const GRID_POINTS: GridId = GridId(3);

pub const LAND_SHAPE: [usize; 2] = [3, 4];
pub const MESH_NODES: usize = 5;

/// A small two-grid ocean model with deterministic dynamics.
///
/// Each step adds 1 to every temperature and clears the rainfall
/// accumulator. Temperature is stored single precision and transposed,
/// so reads exercise widening and strided flattening. The clock runs
/// `0..=100` in steps of 10 s unless configured otherwise.
#[derive(Debug)]
pub struct MockEngine {
    log: CallLog,
    requirement: RuntimeRequirement,
    fail_init: bool,
    panic_init: bool,
    fail_step_after: Option<usize>,
    fail_finalize: bool,
    end_time: f64,
    steps: usize,
    // Native (j fastest) [ny, nx] column-major, i.e. transposed.
    temperature: Vec<f32>,
    salinity: Vec<f64>,
    rainfall: Vec<f64>,
    node_id: Vec<i32>,
    elevation: Vec<f32>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            requirement: RuntimeRequirement::Serial,
            fail_init: false,
            panic_init: false,
            fail_step_after: None,
            fail_finalize: false,
            end_time: 100.0,
            steps: 0,
            temperature: Vec::new(),
            salinity: Vec::new(),
            rainfall: Vec::new(),
            node_id: Vec::new(),
            elevation: Vec::new(),
        }
    }

    /// Handle observing this engine's calls.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Ask for a parallel runtime.
    pub fn parallel(mut self) -> Self {
        self.requirement = RuntimeRequirement::Parallel;
        self
    }

    /// `initialize` fails with code 3.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// `initialize` panics after logging the call.
    pub fn panicking_init(mut self) -> Self {
        self.panic_init = true;
        self
    }

    /// Steps after the first `n` fail with code 11.
    pub fn failing_step_after(mut self, n: usize) -> Self {
        self.fail_step_after = Some(n);
        self
    }

    /// `finalize` fails with code 5.
    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    /// Override the default end time of 100.
    pub fn end_time(mut self, end: f64) -> Self {
        self.end_time = end;
        self
    }

    /// Temperature at canonical index `k` before any step.
    pub fn initial_temperature(k: usize) -> f64 {
        270.0 + k as f64
    }

    fn grids() -> Vec<Grid> {
        let mesh = Mesh::new(vec![0.0, 1.0, 2.0, 1.0, 0.5], vec![0.0, 0.0, 0.0, 1.0, 1.0])
            .with_edges(vec![0, 1, 1, 2, 2, 3, 3, 0])
            .with_faces(vec![0, 1, 3, 1, 2, 3], vec![3, 3]);
        vec![
            Grid::uniform_rectilinear(GRID_LAND, &LAND_SHAPE, &[10.0, 20.0], &[0.0, 0.0])
                .expect("land grid"),
            Grid::unstructured(GRID_MESH, mesh).expect("mesh grid"),
            Grid::scalar(GRID_SCALAR),
            Grid::points(GRID_POINTS, vec![0.0, 1.0, 2.0], vec![0.0, 0.0, 0.0], None)
                .expect("points grid"),
        ]
    }

    fn temperature_layout() -> Layout {
        // Canonical (j, i) sits at j + ny * i.
        Layout::column_major(&LAND_SHAPE)
    }

    fn unknown(name: &str) -> EngineError {
        EngineError::UnknownArray {
            name: name.to_string(),
        }
    }
}

impl Engine for MockEngine {
    fn component_name(&self) -> &str {
        "Mock Ocean Model"
    }

    fn variables(&self) -> Vec<VariableDef> {
        vec![
            VariableDef::input(SALINITY, ValueType::Float64, "1e-3", GRID_LAND),
            VariableDef::input(RAINFALL, ValueType::Float64, "mm s-1", GRID_MESH).accumulating(),
            VariableDef::input(ELEVATION, ValueType::Float32, "m", GRID_MESH),
            VariableDef::communicator(COMM, GRID_SCALAR),
            VariableDef::output(TEMPERATURE, ValueType::Float64, "K", GRID_LAND),
            VariableDef::output(NODE_ID, ValueType::Int32, "1", GRID_MESH),
        ]
    }

    fn runtime_requirement(&self) -> RuntimeRequirement {
        self.requirement
    }

    fn initialize(&mut self, ctx: &InitContext<'_>) -> Result<Domain, EngineError> {
        let keys = ctx.config.keys().map(str::to_string).collect();
        self.log.record(|c| {
            c.init += 1;
            c.communicator = ctx.communicator;
            c.config_keys = keys;
        });
        if self.panic_init {
            panic!("mock engine panicked during initialize");
        }
        if self.fail_init {
            return Err(EngineError::InitFailed {
                code: 3,
                reason: "mock refused to initialize".into(),
            });
        }
        let [ny, nx] = LAND_SHAPE;
        let mut temperature = vec![0.0f32; nx * ny];
        for j in 0..ny {
            for i in 0..nx {
                temperature[j + ny * i] = Self::initial_temperature(j * nx + i) as f32;
            }
        }
        self.temperature = temperature;
        self.salinity = vec![35.0; nx * ny];
        self.rainfall = vec![0.0; MESH_NODES];
        self.node_id = (100..100 + MESH_NODES as i32).collect();
        self.elevation = vec![0.0; MESH_NODES];
        self.steps = 0;
        Ok(Domain {
            grids: Self::grids(),
            clock: ClockSpec::new(0.0, self.end_time, 10.0, "s"),
        })
    }

    fn step(&mut self) -> Result<(), EngineError> {
        self.log.record(|c| c.step += 1);
        if self.fail_step_after.is_some_and(|n| self.steps >= n) {
            return Err(EngineError::StepFailed {
                code: 11,
                reason: format!("mock step {} diverged", self.steps + 1),
            });
        }
        for t in &mut self.temperature {
            *t += 1.0;
        }
        self.rainfall.iter_mut().for_each(|r| *r = 0.0);
        self.steps += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), EngineError> {
        self.log.record(|c| c.finalize += 1);
        if self.fail_finalize {
            return Err(EngineError::FinalizeFailed {
                code: 5,
                reason: "mock could not close its files".into(),
            });
        }
        Ok(())
    }

    fn read(&self, name: &str) -> Result<NativeArray<'_>, EngineError> {
        self.log.record(|c| c.reads += 1);
        match name {
            TEMPERATURE => NativeArray::new(
                NativeData::Float32(&self.temperature),
                Self::temperature_layout(),
            )
            .map_err(|e| EngineError::layout(name, e)),
            SALINITY => Ok(NativeArray::contiguous(NativeData::Float64(&self.salinity))),
            RAINFALL => Ok(NativeArray::contiguous(NativeData::Float64(&self.rainfall))),
            NODE_ID => Ok(NativeArray::contiguous(NativeData::Int32(&self.node_id))),
            ELEVATION => Ok(NativeArray::contiguous(NativeData::Float32(&self.elevation))),
            _ => Err(Self::unknown(name)),
        }
    }

    fn write_target(&mut self, name: &str) -> Result<NativeArrayMut<'_>, EngineError> {
        self.log.record(|c| c.writes += 1);
        match name {
            SALINITY => Ok(NativeArrayMut::contiguous(NativeDataMut::Float64(
                &mut self.salinity,
            ))),
            RAINFALL => Ok(NativeArrayMut::contiguous(NativeDataMut::Float64(
                &mut self.rainfall,
            ))),
            ELEVATION => Ok(NativeArrayMut::contiguous(NativeDataMut::Float32(
                &mut self.elevation,
            ))),
            _ => Err(Self::unknown(name)),
        }
    }
}

// ── CountingRuntime ────────────────────────────────────────────────

/// Counters shared between a [`CountingRuntime`] and the test.
#[derive(Clone, Debug, Default)]
pub struct RuntimeCounts {
    boots: Arc<AtomicUsize>,
    teardowns: Arc<AtomicUsize>,
}

impl RuntimeCounts {
    pub fn boots(&self) -> usize {
        self.boots.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

/// A parallel runtime that only counts calls.
#[derive(Debug, Default)]
pub struct CountingRuntime {
    counts: RuntimeCounts,
    fail_bootstrap: bool,
    finalized_elsewhere: bool,
}

impl CountingRuntime {
    /// Communicator returned by `bootstrap`.
    pub const WORLD: Communicator = Communicator(91);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> RuntimeCounts {
        self.counts.clone()
    }

    /// `bootstrap` fails as if `MPI_Init` returned 16.
    pub fn failing_bootstrap(mut self) -> Self {
        self.fail_bootstrap = true;
        self
    }

    /// `teardown` reports the runtime already finalized.
    pub fn finalized_elsewhere(mut self) -> Self {
        self.finalized_elsewhere = true;
        self
    }
}

impl ParallelRuntime for CountingRuntime {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError> {
        self.counts.boots.fetch_add(1, Ordering::SeqCst);
        if self.fail_bootstrap {
            return Err(RuntimeError::CallFailed {
                function: "MPI_Init",
                code: 16,
            });
        }
        Ok(Some(Self::WORLD))
    }

    fn teardown(&mut self) -> Result<(), RuntimeError> {
        self.counts.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.finalized_elsewhere {
            return Err(RuntimeError::FinalizedElsewhere);
        }
        Ok(())
    }
}

/// Parse inline configuration text, panicking on syntax errors.
pub fn config(text: &str) -> InitConfig {
    InitConfig::from_descriptor(text).expect("fixture configuration parses")
}
