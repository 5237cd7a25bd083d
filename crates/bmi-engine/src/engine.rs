//! The [`Engine`] trait and its initialization context.

use bmi_core::{Communicator, EngineError, InitConfig, NativeArray, NativeArrayMut, VariableDef};

use crate::domain::Domain;

/// Process runtime an engine needs before it can initialize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RuntimeRequirement {
    /// Runs in a plain process.
    #[default]
    Serial,
    /// Needs an MPI runtime bootstrapped before `initialize`.
    Parallel,
}

/// Inputs to [`Engine::initialize`].
#[derive(Clone, Copy, Debug)]
pub struct InitContext<'a> {
    /// Parsed configuration descriptor.
    pub config: &'a InitConfig,
    /// Communicator to run on: the caller's, else the runtime default.
    /// `None` for serial engines with no communicator set.
    pub communicator: Option<Communicator>,
}

/// A timestep-driven simulation the adapter can drive.
///
/// # Contract
///
/// - Construction is cheap: no library loading, file access or runtime
///   calls. All of that belongs in [`initialize`](Engine::initialize),
///   which the adapter calls after the process runtime is up.
/// - [`variables`](Engine::variables) is called once, at adapter
///   construction, and must not change afterwards.
/// - [`read`](Engine::read) and [`write_target`](Engine::write_target) are
///   only called after a successful `initialize`, for names the engine
///   declared. The returned views live for one exchange.
/// - [`finalize`](Engine::finalize) is called at most once, and only if
///   `initialize` was called.
///
/// # Object safety
///
/// This trait is object-safe; the adapter stores `Box<dyn Engine>`.
pub trait Engine: Send + 'static {
    /// Component name reported by `get_component_name`.
    fn component_name(&self) -> &str;

    /// Exchangeable variables, in the order they are reported.
    fn variables(&self) -> Vec<VariableDef>;

    /// Runtime to bootstrap before `initialize`.
    ///
    /// Default: [`RuntimeRequirement::Serial`].
    fn runtime_requirement(&self) -> RuntimeRequirement {
        RuntimeRequirement::Serial
    }

    /// Read the domain, allocate state, report grids and clock.
    fn initialize(&mut self, ctx: &InitContext<'_>) -> Result<Domain, EngineError>;

    /// Advance exactly one time step.
    fn step(&mut self) -> Result<(), EngineError>;

    /// Release engine resources.
    fn finalize(&mut self) -> Result<(), EngineError>;

    /// Borrow the storage behind `name` for reading.
    fn read(&self, name: &str) -> Result<NativeArray<'_>, EngineError>;

    /// Borrow the storage behind `name` for writing.
    ///
    /// Engines with two-timepoint forcing slide the pair here, so the
    /// returned view is the slot the incoming values should land in.
    fn write_target(&mut self, name: &str) -> Result<NativeArrayMut<'_>, EngineError>;
}
