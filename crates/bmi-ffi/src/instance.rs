//! The process-wide adapter instance behind the C surface.
//!
//! C callers see one BMI instance per process. It is created on first
//! `bmi_register` (or `bmi_set_communicator`) and replaced by a fresh one
//! when registering again after `bmi_finalize`. The mutex serializes
//! calls; it does not make the BMI contract concurrent.

use std::ffi::c_char;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use bmi_adapter::{Adapter, LifecycleState, MpiRuntime};
use bmi_engine::Engine;
use bmi_hydro::HydroEngine;
use tracing::{info, warn};

use crate::buffer::{self, code, FfiResult};
use crate::status::BmiStatus;

/// Builds the engine for a new instance.
pub type EngineFactory = fn() -> Box<dyn Engine>;

/// Runtime selected for the next instance.
#[derive(Clone, Debug, PartialEq)]
enum RuntimeChoice {
    /// Whatever the engine asks for.
    EngineDefault,
    /// MPI from the system sonames, or from one library.
    Mpi(Option<PathBuf>),
}

struct Setup {
    factory: Option<EngineFactory>,
    runtime: RuntimeChoice,
}

static INSTANCE: Mutex<Option<Adapter>> = Mutex::new(None);
static SETUP: Mutex<Setup> = Mutex::new(Setup {
    factory: None,
    runtime: RuntimeChoice::EngineDefault,
});

fn default_engine() -> Box<dyn Engine> {
    Box::new(HydroEngine::new())
}

/// Engine used by instances created from now on. `None` restores the
/// hydrology reference engine.
///
/// Rust hosts embedding this library call this before the first
/// `bmi_register`. Returns `false` if the lock is poisoned.
pub fn install_engine(factory: Option<EngineFactory>) -> bool {
    match SETUP.lock() {
        Ok(mut setup) => {
            setup.factory = factory;
            true
        }
        Err(_) => false,
    }
}

/// Whether `slot` holds an instance that has not been finalized.
fn is_live(slot: &Option<Adapter>) -> bool {
    slot.as_ref()
        .is_some_and(|a| a.state() != LifecycleState::Finalized)
}

/// Lock the instance slot.
///
/// A panic caught by `ffi_guard!` while the slot was held leaves it
/// poisoned. The adapter inside is still structurally sound (its state
/// only changes after the engine returns), so the guard is recovered and
/// the caller can still finalize it.
fn lock_instance() -> MutexGuard<'static, Option<Adapter>> {
    INSTANCE.lock().unwrap_or_else(|poisoned| {
        warn!("instance lock poisoned by an earlier panic; recovering");
        INSTANCE.clear_poison();
        poisoned.into_inner()
    })
}

/// The factory and runtime for the next instance.
fn next_setup() -> Result<(EngineFactory, RuntimeChoice), BmiStatus> {
    let setup = SETUP.lock().map_err(|_| BmiStatus::InternalError)?;
    Ok((setup.factory.unwrap_or(default_engine), setup.runtime.clone()))
}

/// The live instance, creating a fresh one if there is none.
pub(crate) fn ensure(slot: &mut Option<Adapter>) -> Result<&mut Adapter, BmiStatus> {
    if !is_live(slot) {
        // SETUP is released before the factory runs.
        let (factory, runtime) = next_setup()?;
        let mut builder = Adapter::builder(factory());
        if let RuntimeChoice::Mpi(library) = runtime {
            let runtime = match library {
                Some(path) => MpiRuntime::with_library(path),
                None => MpiRuntime::system(),
            };
            builder = builder.runtime(Box::new(runtime));
        }
        let adapter = builder.build().map_err(BmiStatus::from)?;
        info!(
            component = adapter.component_name(),
            runtime = adapter.runtime_name(),
            "instance created"
        );
        *slot = Some(adapter);
    }
    slot.as_mut().ok_or(BmiStatus::InternalError)
}

/// Run `f` on the existing instance. No instance is a protocol error.
pub(crate) fn with_adapter(f: impl FnOnce(&mut Adapter) -> FfiResult) -> i32 {
    match lock_instance().as_mut() {
        Some(adapter) => code(f(adapter)),
        None => BmiStatus::ProtocolError as i32,
    }
}

/// Run `f` on the instance, creating it first if needed.
pub(crate) fn with_new_or_live(f: impl FnOnce(&mut Adapter) -> FfiResult) -> i32 {
    let mut slot = lock_instance();
    code(ensure(&mut slot).and_then(f))
}

/// Use the MPI runtime for instances created from now on.
///
/// `path` names an MPI shared library; null means the system library.
/// Fails with `ProtocolError` while an instance is live.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_parallel_runtime(path: *const c_char) -> i32 {
    ffi_guard!({
        let library = if path.is_null() {
            None
        } else {
            // SAFETY: non-null, NUL-terminated per caller contract.
            match unsafe { buffer::c_str(path) } {
                Ok(p) => Some(PathBuf::from(p)),
                Err(status) => return status as i32,
            }
        };
        let slot = lock_instance();
        if is_live(&*slot) {
            return BmiStatus::ProtocolError as i32;
        }
        drop(slot);
        ffi_lock!(SETUP).runtime = RuntimeChoice::Mpi(library);
        BmiStatus::Success as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factory_builds_hydro() {
        assert_eq!(default_engine().component_name(), "Hydro Reference Model v1.0");
    }

    #[test]
    fn empty_slot_is_not_live() {
        assert!(!is_live(&None));
    }
}
