//! The adapter facade.
//!
//! [`Adapter`] wraps one [`Engine`] and exposes it through the BMI
//! operations: lifecycle control, metadata, time and value exchange.
//!
//! # Ownership model
//!
//! `Adapter` is [`Send`] but not internally locked; every mutating
//! operation takes `&mut self`. The process-wide [`EngineSlot`] is what
//! keeps two adapters from driving the engine at once.
//!
//! # Shutdown
//!
//! [`finalize()`](Adapter::finalize) tears the engine down, then the
//! parallel runtime, then releases the slot. Dropping a live adapter does
//! the same and logs any failure.

use bmi_catalog::Catalog;
use bmi_core::{
    Binding, Communicator, Element, InitConfig, ValueSlice, ValueSliceMut, ValueType, VarRole,
    VariableDef,
};
use bmi_engine::{Domain, Engine, InitContext, RuntimeRequirement};
use tracing::{debug, error, info, instrument, warn};

use crate::bridge::{MpiRuntime, ParallelRuntime, ProcessBridge, SerialRuntime};
use crate::clock::SessionClock;
use crate::error::{AdapterError, MarshalError};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::marshal;
use crate::slot::{EngineSlot, SlotClaim};

// Compile-time assertion: Adapter is Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Adapter>();
    }
};

// ── AdapterBuilder ─────────────────────────────────────────────────

/// Configures an [`Adapter`] before construction.
///
/// Defaults: the process slot, and [`MpiRuntime::system()`] for engines
/// requiring [`RuntimeRequirement::Parallel`], [`SerialRuntime`]
/// otherwise.
pub struct AdapterBuilder {
    engine: Box<dyn Engine>,
    runtime: Option<Box<dyn ParallelRuntime>>,
    slot: Option<&'static EngineSlot>,
}

impl AdapterBuilder {
    /// Use `runtime` instead of the default for the engine's requirement.
    pub fn runtime(mut self, runtime: Box<dyn ParallelRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Contend for `slot` instead of the process slot.
    pub fn slot(mut self, slot: &'static EngineSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Build the adapter. Reads the engine's variable table once.
    ///
    /// # Errors
    ///
    /// [`AdapterError::Catalog`] if the variable table is malformed.
    pub fn build(self) -> Result<Adapter, AdapterError> {
        let catalog = Catalog::new(self.engine.variables())?;
        let runtime: Box<dyn ParallelRuntime> = match self.runtime {
            Some(runtime) => runtime,
            None => match self.engine.runtime_requirement() {
                RuntimeRequirement::Parallel => Box::new(MpiRuntime::system()),
                RuntimeRequirement::Serial => Box::new(SerialRuntime),
            },
        };
        Ok(Adapter {
            name: self.engine.component_name().to_string(),
            engine: self.engine,
            catalog,
            lifecycle: Lifecycle::new(),
            clock: None,
            bridge: ProcessBridge::new(runtime),
            slot: self.slot.unwrap_or_else(EngineSlot::process),
            claim: None,
            communicator: None,
            engine_touched: false,
        })
    }
}

// ── Adapter ────────────────────────────────────────────────────────

/// One BMI session over one engine.
pub struct Adapter {
    engine: Box<dyn Engine>,
    name: String,
    catalog: Catalog,
    lifecycle: Lifecycle,
    clock: Option<SessionClock>,
    bridge: ProcessBridge,
    slot: &'static EngineSlot,
    claim: Option<SlotClaim>,
    communicator: Option<Communicator>,
    // engine.initialize has been entered, so engine.finalize is owed.
    engine_touched: bool,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("component", &self.name)
            .field("state", &self.lifecycle.state())
            .field("bridge", &self.bridge)
            .field("communicator", &self.communicator)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Wrap `engine` with default runtime and slot.
    pub fn new(engine: impl Engine) -> Result<Self, AdapterError> {
        Self::builder(Box::new(engine)).build()
    }

    /// Start configuring an adapter around `engine`.
    pub fn builder(engine: Box<dyn Engine>) -> AdapterBuilder {
        AdapterBuilder {
            engine,
            runtime: None,
            slot: None,
        }
    }

    /// Engine component name.
    pub fn component_name(&self) -> &str {
        &self.name
    }

    /// Lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Variable and grid metadata.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Communicator the engine runs (or will run) on, if any.
    pub fn communicator(&self) -> Option<Communicator> {
        self.communicator
    }

    /// Name of the parallel runtime behind the bridge.
    pub fn runtime_name(&self) -> &'static str {
        self.bridge.runtime_name()
    }

    fn protocol(&self, op: &'static str) -> AdapterError {
        AdapterError::Protocol {
            op,
            state: self.lifecycle.state(),
        }
    }

    // ── lifecycle ──────────────────────────────────────────────────

    /// Claim the process-wide engine slot.
    ///
    /// # Errors
    ///
    /// [`AdapterError::SingletonViolation`] if another live adapter holds
    /// the slot, or this one already does.
    pub fn register(&mut self) -> Result<(), AdapterError> {
        self.lifecycle.check_register()?;
        let Some(claim) = self.slot.claim() else {
            warn!(component = %self.name, "engine slot held by another instance");
            return Err(AdapterError::SingletonViolation);
        };
        self.claim = Some(claim);
        self.lifecycle.registered();
        info!(component = %self.name, "registered");
        Ok(())
    }

    /// Set the communicator passed to engine initialization.
    ///
    /// Overrides the runtime's default. Legal only before `initialize`.
    pub fn set_communicator(&mut self, comm: Communicator) -> Result<(), AdapterError> {
        self.lifecycle.check_communicator()?;
        debug!(component = %self.name, communicator = %comm, "communicator set");
        self.communicator = Some(comm);
        Ok(())
    }

    /// Parse `descriptor` (a path or inline text) and initialize.
    pub fn initialize(&mut self, descriptor: &str) -> Result<(), AdapterError> {
        self.lifecycle.check_initialize()?;
        let config = InitConfig::from_descriptor(descriptor)?;
        self.initialize_with(&config)
    }

    /// Initialize from an already parsed configuration.
    ///
    /// Bootstraps the runtime, initializes the engine, installs its grids
    /// and starts the clock. On failure the state stays `Registered`.
    #[instrument(skip_all, fields(component = %self.name))]
    pub fn initialize_with(&mut self, config: &InitConfig) -> Result<(), AdapterError> {
        self.lifecycle.check_initialize()?;
        let runtime_default = if self.bridge.is_active() {
            self.bridge.communicator()
        } else {
            self.bridge.bootstrap()?
        };
        let communicator = self.communicator.or(runtime_default);

        self.engine_touched = true;
        let domain = self
            .engine
            .initialize(&InitContext {
                config,
                communicator,
            })
            .map_err(|e| {
                error!(error = %e, "engine initialization failed");
                AdapterError::Engine(e)
            })?;

        let grids = domain.grids.len();
        let clock = match self.install_domain(domain) {
            Ok(clock) => clock,
            Err(e) => {
                error!(error = %e, "engine domain rejected");
                // The engine is live; tear it down so a retry starts clean.
                if let Err(fe) = self.engine.finalize() {
                    error!(error = %fe, "engine teardown after rejected domain failed");
                }
                self.engine_touched = false;
                return Err(e);
            }
        };
        info!(
            start = clock.start_time(),
            end = clock.end_time(),
            dt = clock.time_step(),
            grids,
            communicator = ?communicator,
            "initialized"
        );
        self.clock = Some(clock);
        self.communicator = communicator;
        self.lifecycle.initialized();
        Ok(())
    }

    fn install_domain(&mut self, domain: Domain) -> Result<SessionClock, AdapterError> {
        let clock = SessionClock::new(&domain.clock)?;
        self.catalog
            .install_grids(domain.grids)
            .map_err(|e| AdapterError::InvalidDomain {
                reason: e.to_string(),
            })?;
        Ok(clock)
    }

    /// Advance exactly one time step.
    pub fn update(&mut self) -> Result<(), AdapterError> {
        self.lifecycle.check_running("update")?;
        self.step_once("update")
    }

    /// Step until the clock reaches the first step boundary at or after
    /// `time`. A target equal to the current time is a no-op.
    #[instrument(skip(self), fields(component = %self.name))]
    pub fn update_until(&mut self, time: f64) -> Result<(), AdapterError> {
        self.lifecycle.check_running("update_until")?;
        let steps = self.clock_for("update_until")?.steps_until(time)?;
        debug!(steps, "stepping to target");
        for _ in 0..steps {
            self.step_once("update_until")?;
        }
        Ok(())
    }

    fn step_once(&mut self, op: &'static str) -> Result<(), AdapterError> {
        let Some(clock) = self.clock.as_mut() else {
            return Err(AdapterError::Protocol {
                op,
                state: self.lifecycle.state(),
            });
        };
        clock.check_step()?;
        if let Err(e) = self.engine.step() {
            error!(
                component = %self.name,
                step = clock.steps() + 1,
                error = %e,
                "engine step failed"
            );
            return Err(AdapterError::Engine(e));
        }
        clock.advance();
        self.lifecycle.stepped();
        debug!(component = %self.name, time = clock.current_time(), "stepped");
        Ok(())
    }

    /// Tear down engine and runtime, release the slot. Terminal.
    ///
    /// Runtime teardown and slot release happen even if the engine's own
    /// teardown fails; that failure is reported afterwards.
    #[instrument(skip(self), fields(component = %self.name))]
    pub fn finalize(&mut self) -> Result<(), AdapterError> {
        self.lifecycle.check_finalize()?;
        let engine_result = if self.engine_touched {
            self.engine.finalize()
        } else {
            Ok(())
        };
        self.lifecycle.finalized();
        self.clock = None;
        let runtime_result = self.bridge.teardown();
        self.claim = None;

        if let Err(e) = engine_result {
            error!(error = %e, "engine finalization failed");
            if let Err(re) = runtime_result {
                error!(error = %re, "runtime teardown failed");
            }
            return Err(AdapterError::Engine(e));
        }
        runtime_result?;
        info!("finalized");
        Ok(())
    }

    // ── time ───────────────────────────────────────────────────────

    fn clock_for(&self, op: &'static str) -> Result<&SessionClock, AdapterError> {
        self.clock.as_ref().ok_or_else(|| self.protocol(op))
    }

    /// Start time of the session.
    pub fn start_time(&self) -> Result<f64, AdapterError> {
        self.clock_for("get_start_time").map(SessionClock::start_time)
    }

    /// End time of the session; `+inf` if unbounded.
    pub fn end_time(&self) -> Result<f64, AdapterError> {
        self.clock_for("get_end_time").map(SessionClock::end_time)
    }

    /// Current model time.
    pub fn current_time(&self) -> Result<f64, AdapterError> {
        self.clock_for("get_current_time").map(SessionClock::current_time)
    }

    /// Length of one `update()`.
    pub fn time_step(&self) -> Result<f64, AdapterError> {
        self.clock_for("get_time_step").map(SessionClock::time_step)
    }

    /// Unit string of all time values.
    pub fn time_units(&self) -> Result<&str, AdapterError> {
        self.clock_for("get_time_units").map(SessionClock::time_units)
    }

    // ── values ─────────────────────────────────────────────────────

    fn check_type(var: &VariableDef, actual: ValueType) -> Result<(), AdapterError> {
        if var.value_type == actual {
            Ok(())
        } else {
            Err(AdapterError::TypeMismatch {
                name: var.name.clone(),
                expected: var.value_type,
                actual,
            })
        }
    }

    fn check_len(var: &VariableDef, expected: usize, actual: usize) -> Result<(), AdapterError> {
        if expected == actual {
            Ok(())
        } else {
            Err(AdapterError::BufferSizeMismatch {
                name: var.name.clone(),
                expected,
                actual,
            })
        }
    }

    fn check_writable(var: &VariableDef) -> Result<(), AdapterError> {
        match var.role {
            VarRole::Input => Ok(()),
            VarRole::Output => Err(AdapterError::ReadOnly {
                name: var.name.clone(),
            }),
        }
    }

    fn check_indices(
        var: &VariableDef,
        indices: &[usize],
        size: usize,
    ) -> Result<(), AdapterError> {
        match indices.iter().find(|&&i| i >= size) {
            Some(&index) => Err(AdapterError::IndexOutOfRange {
                name: var.name.clone(),
                index: index as i64,
                size,
            }),
            None => Ok(()),
        }
    }

    /// Element count of a running engine variable.
    fn running_size(&self, var: &VariableDef, op: &'static str) -> Result<usize, AdapterError> {
        self.lifecycle.check_running(op)?;
        Ok(self.catalog.var_size(&var.name)?)
    }

    fn storage(name: &str) -> impl FnOnce(MarshalError) -> AdapterError + '_ {
        move |source| AdapterError::StorageMismatch {
            name: name.to_string(),
            source,
        }
    }

    /// Copy `name` into `dest`, flattened to canonical order.
    ///
    /// Checks name, lifecycle state, buffer type and buffer length, in
    /// that order, before the engine is touched.
    pub fn get_value(&self, name: &str, dest: ValueSliceMut<'_>) -> Result<(), AdapterError> {
        let var = self.catalog.variable(name)?;
        if var.binding == Binding::Communicator {
            return self.read_communicator(var, dest);
        }
        let size = self.running_size(var, "get_value")?;
        Self::check_type(var, dest.value_type())?;
        Self::check_len(var, size, dest.len())?;
        let array = self.engine.read(name)?;
        marshal::read_into(&array, dest).map_err(Self::storage(name))?;
        debug!(component = %self.name, variable = name, "get_value");
        Ok(())
    }

    /// Copy the elements of `name` at flat `indices` into `dest`.
    pub fn get_value_at_indices(
        &self,
        name: &str,
        dest: ValueSliceMut<'_>,
        indices: &[usize],
    ) -> Result<(), AdapterError> {
        let var = self.catalog.variable(name)?;
        if var.binding == Binding::Communicator {
            Self::check_len(var, indices.len(), dest.len())?;
            Self::check_indices(var, indices, 1)?;
            return match dest {
                ValueSliceMut::Int32([]) => Ok(()),
                dest => self.read_communicator(var, dest),
            };
        }
        let size = self.running_size(var, "get_value_at_indices")?;
        Self::check_type(var, dest.value_type())?;
        Self::check_len(var, indices.len(), dest.len())?;
        Self::check_indices(var, indices, size)?;
        let array = self.engine.read(name)?;
        marshal::read_at(&array, indices, dest).map_err(Self::storage(name))
    }

    /// Read `name` into a freshly allocated vector.
    pub fn get_value_vec<T: Element>(&self, name: &str) -> Result<Vec<T>, AdapterError> {
        let var = self.catalog.variable(name)?;
        let len = match var.binding {
            Binding::Communicator => 1,
            Binding::Engine => self.running_size(var, "get_value")?,
        };
        let mut out = vec![T::default(); len];
        self.get_value(name, T::slice_mut(&mut out))?;
        Ok(out)
    }

    /// Write `src` to `name` under its write policy.
    ///
    /// Checks name, access, lifecycle state, buffer type and buffer
    /// length, in that order, before the engine is touched.
    pub fn set_value(&mut self, name: &str, src: ValueSlice<'_>) -> Result<(), AdapterError> {
        let var = self.catalog.variable(name)?;
        if var.binding == Binding::Communicator {
            return self.write_communicator(name, src);
        }
        Self::check_writable(var)?;
        let size = self.running_size(var, "set_value")?;
        Self::check_type(var, src.value_type())?;
        Self::check_len(var, size, src.len())?;
        let policy = var.policy;
        let mut target = self.engine.write_target(name)?;
        marshal::write_from(&mut target, src, policy).map_err(Self::storage(name))?;
        debug!(component = %self.name, variable = name, ?policy, "set_value");
        Ok(())
    }

    /// Write `src` to the elements of `name` at flat `indices`.
    pub fn set_value_at_indices(
        &mut self,
        name: &str,
        indices: &[usize],
        src: ValueSlice<'_>,
    ) -> Result<(), AdapterError> {
        let var = self.catalog.variable(name)?;
        if var.binding == Binding::Communicator {
            Self::check_len(var, indices.len(), src.len())?;
            Self::check_indices(var, indices, 1)?;
            return match src {
                ValueSlice::Int32([]) => Ok(()),
                src => self.write_communicator(name, src),
            };
        }
        Self::check_writable(var)?;
        let size = self.running_size(var, "set_value_at_indices")?;
        Self::check_type(var, src.value_type())?;
        Self::check_len(var, indices.len(), src.len())?;
        Self::check_indices(var, indices, size)?;
        let policy = var.policy;
        let mut target = self.engine.write_target(name)?;
        marshal::write_at(&mut target, indices, src, policy).map_err(Self::storage(name))
    }

    fn read_communicator(
        &self,
        var: &VariableDef,
        dest: ValueSliceMut<'_>,
    ) -> Result<(), AdapterError> {
        Self::check_type(var, dest.value_type())?;
        Self::check_len(var, 1, dest.len())?;
        let comm = self.communicator.unwrap_or(Communicator::NONE);
        if let ValueSliceMut::Int32([slot]) = dest {
            *slot = comm.0;
        }
        Ok(())
    }

    fn write_communicator(&mut self, name: &str, src: ValueSlice<'_>) -> Result<(), AdapterError> {
        let var = self.catalog.variable(name)?;
        self.lifecycle.check_communicator()?;
        Self::check_type(var, src.value_type())?;
        Self::check_len(var, 1, src.len())?;
        if let ValueSlice::Int32(&[handle]) = src {
            self.set_communicator(Communicator(handle))?;
        }
        Ok(())
    }
}

impl Drop for Adapter {
    fn drop(&mut self) {
        if self.lifecycle.state().is_live() {
            warn!(
                component = %self.name,
                state = %self.lifecycle.state(),
                "dropped without finalize"
            );
            if let Err(e) = self.finalize() {
                warn!(component = %self.name, error = %e, "finalize on drop failed");
            }
        }
    }
}
