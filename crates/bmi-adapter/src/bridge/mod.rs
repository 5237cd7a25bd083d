//! The process lifecycle bridge.
//!
//! Engines built as MPI programs need the MPI runtime up before they
//! initialize and torn down after they finalize, exactly once per
//! process. [`ParallelRuntime`] abstracts the runtime; [`ProcessBridge`]
//! enforces the once-only ordering around it.

mod mpi;

pub use mpi::{MpiFlavour, MpiRuntime, DEFAULT_SONAMES};

use bmi_core::Communicator;
use tracing::{info, warn};

use crate::error::RuntimeError;

/// A process runtime the adapter brings up before engine init.
pub trait ParallelRuntime: Send {
    /// Name for logs and errors.
    fn name(&self) -> &'static str;

    /// Bring the runtime up.
    ///
    /// Returns the default communicator, or `None` if the runtime has no
    /// notion of one.
    fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError>;

    /// Shut the runtime down.
    ///
    /// Returns [`RuntimeError::FinalizedElsewhere`] if something else in
    /// the process already did.
    fn teardown(&mut self) -> Result<(), RuntimeError>;
}

/// No runtime: a plain process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialRuntime;

impl ParallelRuntime for SerialRuntime {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError> {
        Ok(None)
    }

    fn teardown(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Active(Option<Communicator>),
    TornDown,
}

/// Bootstrap-once, teardown-once guard around a [`ParallelRuntime`].
pub struct ProcessBridge {
    runtime: Box<dyn ParallelRuntime>,
    phase: Phase,
}

impl std::fmt::Debug for ProcessBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBridge")
            .field("runtime", &self.runtime.name())
            .field("phase", &self.phase)
            .finish()
    }
}

impl ProcessBridge {
    /// Wrap `runtime`; nothing is started yet.
    pub fn new(runtime: Box<dyn ParallelRuntime>) -> Self {
        Self {
            runtime,
            phase: Phase::Idle,
        }
    }

    /// Name of the wrapped runtime.
    pub fn runtime_name(&self) -> &'static str {
        self.runtime.name()
    }

    /// Whether the runtime is up.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }

    /// Default communicator of an active runtime.
    pub fn communicator(&self) -> Option<Communicator> {
        match self.phase {
            Phase::Active(comm) => comm,
            _ => None,
        }
    }

    /// Bring the runtime up. Legal once.
    pub fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError> {
        match self.phase {
            Phase::Idle => {}
            Phase::Active(_) => return Err(RuntimeError::AlreadyBootstrapped),
            Phase::TornDown => return Err(RuntimeError::AlreadyTornDown),
        }
        let comm = self.runtime.bootstrap()?;
        info!(runtime = self.runtime.name(), communicator = ?comm, "runtime bootstrapped");
        self.phase = Phase::Active(comm);
        Ok(comm)
    }

    /// Shut the runtime down. Legal once.
    ///
    /// A bridge that never bootstrapped has nothing to tear down and just
    /// closes. The bridge is closed afterwards even if the runtime call
    /// fails, so a failed teardown is never retried.
    pub fn teardown(&mut self) -> Result<(), RuntimeError> {
        match std::mem::replace(&mut self.phase, Phase::TornDown) {
            Phase::Idle => Ok(()),
            Phase::TornDown => Err(RuntimeError::AlreadyTornDown),
            Phase::Active(_) => match self.runtime.teardown() {
                Ok(()) => {
                    info!(runtime = self.runtime.name(), "runtime torn down");
                    Ok(())
                }
                Err(RuntimeError::FinalizedElsewhere) => {
                    warn!(
                        runtime = self.runtime.name(),
                        "runtime already finalized elsewhere, skipping teardown"
                    );
                    Ok(())
                }
                Err(e) => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting {
        boots: Arc<AtomicUsize>,
        downs: Arc<AtomicUsize>,
        elsewhere: bool,
    }

    impl ParallelRuntime for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError> {
            self.boots.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Communicator(5)))
        }

        fn teardown(&mut self) -> Result<(), RuntimeError> {
            self.downs.fetch_add(1, Ordering::SeqCst);
            if self.elsewhere {
                Err(RuntimeError::FinalizedElsewhere)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn bootstrap_and_teardown_once() {
        let runtime = Counting::default();
        let (boots, downs) = (runtime.boots.clone(), runtime.downs.clone());
        let mut bridge = ProcessBridge::new(Box::new(runtime));

        assert_eq!(bridge.bootstrap(), Ok(Some(Communicator(5))));
        assert_eq!(bridge.communicator(), Some(Communicator(5)));
        assert_eq!(bridge.bootstrap(), Err(RuntimeError::AlreadyBootstrapped));

        bridge.teardown().unwrap();
        assert_eq!(bridge.teardown(), Err(RuntimeError::AlreadyTornDown));
        assert_eq!(bridge.bootstrap(), Err(RuntimeError::AlreadyTornDown));

        assert_eq!(boots.load(Ordering::SeqCst), 1);
        assert_eq!(downs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn teardown_without_bootstrap_is_a_no_op() {
        let runtime = Counting::default();
        let downs = runtime.downs.clone();
        let mut bridge = ProcessBridge::new(Box::new(runtime));
        bridge.teardown().unwrap();
        assert_eq!(downs.load(Ordering::SeqCst), 0);
        assert!(!bridge.is_active());
    }

    #[test]
    fn finalized_elsewhere_is_not_an_error() {
        let mut bridge = ProcessBridge::new(Box::new(Counting {
            elsewhere: true,
            ..Counting::default()
        }));
        bridge.bootstrap().unwrap();
        assert_eq!(bridge.teardown(), Ok(()));
    }

    #[test]
    fn serial_runtime_has_no_communicator() {
        let mut bridge = ProcessBridge::new(Box::new(SerialRuntime));
        assert_eq!(bridge.bootstrap(), Ok(None));
        assert!(bridge.is_active());
        bridge.teardown().unwrap();
    }
}
