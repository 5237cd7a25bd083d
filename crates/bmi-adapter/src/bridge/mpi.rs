//! MPI runtime loaded at run time with `libloading`.
//!
//! The library is opened `RTLD_NOW | RTLD_GLOBAL`: Open MPI loads its
//! transport plugins with `dlopen` and those resolve `libmpi` symbols
//! from the global namespace.

use std::ffi::{c_char, c_int};
use std::path::PathBuf;

use bmi_core::Communicator;
use tracing::{debug, info, warn};

use super::ParallelRuntime;
use crate::error::RuntimeError;

/// Sonames tried, in order, when no explicit library path is given.
pub const DEFAULT_SONAMES: [&str; 3] = ["libmpi.so.40", "libmpi.so.12", "libmpi.so"];

/// MPI implementation family, which fixes the Fortran world handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MpiFlavour {
    /// Open MPI: `MPI_Comm_c2f(MPI_COMM_WORLD) == 0`.
    OpenMpi,
    /// MPICH and derivatives: `MPI_COMM_WORLD == 0x44000000`.
    Mpich,
}

impl MpiFlavour {
    /// Fortran handle of `MPI_COMM_WORLD`.
    pub fn world(self) -> Communicator {
        match self {
            Self::OpenMpi => Communicator(0),
            Self::Mpich => Communicator(0x4400_0000),
        }
    }
}

type FlagFn = unsafe extern "C" fn(*mut c_int) -> c_int;
type InitFn = unsafe extern "C" fn(*mut c_int, *mut *mut *mut c_char) -> c_int;
type FinalizeFn = unsafe extern "C" fn() -> c_int;

/// The four MPI entry points the runtime drives.
#[cfg_attr(not(unix), allow(dead_code))]
#[derive(Clone, Copy)]
struct EntryPoints {
    initialized: FlagFn,
    init: InitFn,
    finalized: FlagFn,
    finalize: FinalizeFn,
}

#[cfg_attr(not(unix), allow(dead_code))]
struct Loaded {
    // Keeps the entry points below mapped.
    #[cfg(unix)]
    _library: Option<libloading::os::unix::Library>,
    path: String,
    flavour: MpiFlavour,
    entry: EntryPoints,
}

/// The system MPI runtime.
///
/// Nothing is loaded until [`bootstrap`](ParallelRuntime::bootstrap).
/// If the host already initialized MPI (mpi4py, a launcher), bootstrap
/// adopts it and teardown leaves finalization to the host.
pub struct MpiRuntime {
    candidates: Vec<PathBuf>,
    loaded: Option<Loaded>,
    initialized_here: bool,
}

impl std::fmt::Debug for MpiRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpiRuntime")
            .field("candidates", &self.candidates)
            .field("initialized_here", &self.initialized_here)
            .finish_non_exhaustive()
    }
}

impl MpiRuntime {
    /// Search [`DEFAULT_SONAMES`] through the dynamic loader's path.
    pub fn system() -> Self {
        Self::with_candidates(DEFAULT_SONAMES.iter().map(PathBuf::from).collect())
    }

    /// Load exactly `path`.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self::with_candidates(vec![path.into()])
    }

    fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            loaded: None,
            initialized_here: false,
        }
    }

    /// Library paths or sonames this runtime will try.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    #[cfg(unix)]
    #[allow(unsafe_code)]
    fn load(&self) -> Result<Loaded, RuntimeError> {
        use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW};

        let mut tried = Vec::new();
        for candidate in &self.candidates {
            // SAFETY: opening libmpi runs only its ELF constructors, which
            // do not initialize MPI itself.
            let library = match unsafe { Library::open(Some(candidate), RTLD_NOW | RTLD_GLOBAL) } {
                Ok(lib) => lib,
                Err(e) => {
                    tried.push(format!("{}: {e}", candidate.display()));
                    continue;
                }
            };
            let missing = |symbol: &'static str| {
                move |e: libloading::Error| RuntimeError::MissingSymbol {
                    symbol,
                    reason: e.to_string(),
                }
            };
            // SAFETY: the types match the MPI C bindings for these symbols.
            let (initialized, init, finalized, finalize) = unsafe {
                (
                    *library
                        .get::<FlagFn>(b"MPI_Initialized\0")
                        .map_err(missing("MPI_Initialized"))?,
                    *library
                        .get::<InitFn>(b"MPI_Init\0")
                        .map_err(missing("MPI_Init"))?,
                    *library
                        .get::<FlagFn>(b"MPI_Finalized\0")
                        .map_err(missing("MPI_Finalized"))?,
                    *library
                        .get::<FinalizeFn>(b"MPI_Finalize\0")
                        .map_err(missing("MPI_Finalize"))?,
                )
            };
            // SAFETY: only the symbol's presence is inspected.
            let is_open_mpi = unsafe {
                library
                    .get::<*mut std::ffi::c_void>(b"ompi_mpi_comm_world\0")
                    .is_ok()
            };
            let flavour = if is_open_mpi {
                MpiFlavour::OpenMpi
            } else {
                MpiFlavour::Mpich
            };
            return Ok(Loaded {
                _library: Some(library),
                path: candidate.display().to_string(),
                flavour,
                entry: EntryPoints {
                    initialized,
                    init,
                    finalized,
                    finalize,
                },
            });
        }
        Err(RuntimeError::LibraryNotFound { tried })
    }
}

#[cfg_attr(not(unix), allow(dead_code))]
impl MpiRuntime {
    /// Initialize MPI through the loaded entry points, or adopt a running
    /// instance. A finalized MPI cannot be initialized again.
    #[allow(unsafe_code)]
    fn start(&mut self) -> Result<Option<Communicator>, RuntimeError> {
        let Some(mpi) = self.loaded.as_ref() else {
            return Err(RuntimeError::LibraryNotFound { tried: Vec::new() });
        };
        if query("MPI_Finalized", mpi.entry.finalized)? {
            warn!(library = %mpi.path, "MPI already finalized in this process");
            return Err(RuntimeError::NotRestartable);
        }
        if query("MPI_Initialized", mpi.entry.initialized)? {
            info!(library = %mpi.path, "MPI already initialized by the host");
        } else {
            // SAFETY: MPI_Init accepts null argc/argv.
            let rc = unsafe { (mpi.entry.init)(std::ptr::null_mut(), std::ptr::null_mut()) };
            if rc != 0 {
                return Err(RuntimeError::CallFailed {
                    function: "MPI_Init",
                    code: rc,
                });
            }
            self.initialized_here = true;
            info!(library = %mpi.path, flavour = ?mpi.flavour, "MPI initialized");
        }
        Ok(Some(mpi.flavour.world()))
    }

    /// Finalize MPI if this runtime initialized it.
    #[allow(unsafe_code)]
    fn stop(&mut self) -> Result<(), RuntimeError> {
        let Some(mpi) = self.loaded.as_ref() else {
            return Ok(());
        };
        if query("MPI_Finalized", mpi.entry.finalized)? {
            return Err(RuntimeError::FinalizedElsewhere);
        }
        if !self.initialized_here {
            debug!("MPI owned by the host, leaving it running");
            return Ok(());
        }
        // SAFETY: MPI is initialized and not yet finalized.
        let rc = unsafe { (mpi.entry.finalize)() };
        self.initialized_here = false;
        if rc != 0 {
            return Err(RuntimeError::CallFailed {
                function: "MPI_Finalize",
                code: rc,
            });
        }
        Ok(())
    }
}

#[cfg_attr(not(unix), allow(dead_code))]
#[allow(unsafe_code)]
fn query(function: &'static str, f: FlagFn) -> Result<bool, RuntimeError> {
    let mut flag: c_int = 0;
    // SAFETY: `flag` is a valid out-pointer for the call's duration.
    let rc = unsafe { f(&mut flag) };
    if rc != 0 {
        return Err(RuntimeError::CallFailed { function, code: rc });
    }
    Ok(flag != 0)
}

impl ParallelRuntime for MpiRuntime {
    fn name(&self) -> &'static str {
        "mpi"
    }

    #[cfg(unix)]
    fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError> {
        if self.loaded.is_none() {
            self.loaded = Some(self.load()?);
        }
        self.start()
    }

    #[cfg(not(unix))]
    fn bootstrap(&mut self) -> Result<Option<Communicator>, RuntimeError> {
        Err(RuntimeError::Unsupported { runtime: "mpi" })
    }

    #[cfg(unix)]
    fn teardown(&mut self) -> Result<(), RuntimeError> {
        self.stop()
    }

    #[cfg(not(unix))]
    fn teardown(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static INITIALIZED: Cell<bool> = const { Cell::new(false) };
        static FINALIZED: Cell<bool> = const { Cell::new(false) };
        static INIT_CALLS: Cell<u32> = const { Cell::new(0) };
    }

    extern "C" fn fake_initialized(flag: *mut c_int) -> c_int {
        // SAFETY: `query` passes a live out-pointer.
        unsafe { *flag = c_int::from(INITIALIZED.get()) };
        0
    }

    extern "C" fn fake_finalized(flag: *mut c_int) -> c_int {
        // SAFETY: `query` passes a live out-pointer.
        unsafe { *flag = c_int::from(FINALIZED.get()) };
        0
    }

    extern "C" fn fake_init(_argc: *mut c_int, _argv: *mut *mut *mut c_char) -> c_int {
        INIT_CALLS.set(INIT_CALLS.get() + 1);
        INITIALIZED.set(true);
        0
    }

    extern "C" fn fake_finalize() -> c_int {
        FINALIZED.set(true);
        0
    }

    /// Fresh MPI state for this thread; `host` marks it initialized already.
    fn reset(host: bool) {
        INITIALIZED.set(host);
        FINALIZED.set(false);
        INIT_CALLS.set(0);
    }

    fn fake_runtime() -> MpiRuntime {
        let mut rt = MpiRuntime::with_library("fake-libmpi");
        rt.loaded = Some(Loaded {
            #[cfg(unix)]
            _library: None,
            path: "fake-libmpi".into(),
            flavour: MpiFlavour::OpenMpi,
            entry: EntryPoints {
                initialized: fake_initialized,
                init: fake_init,
                finalized: fake_finalized,
                finalize: fake_finalize,
            },
        });
        rt
    }

    #[test]
    fn world_handles_per_flavour() {
        assert_eq!(MpiFlavour::OpenMpi.world(), Communicator(0));
        assert_eq!(MpiFlavour::Mpich.world(), Communicator(0x4400_0000));
    }

    #[test]
    fn system_tries_standard_sonames() {
        let rt = MpiRuntime::system();
        let names: Vec<_> = rt.candidates().iter().map(|p| p.display().to_string()).collect();
        assert_eq!(names, DEFAULT_SONAMES);
    }

    #[cfg(unix)]
    #[test]
    fn missing_library_is_reported() {
        let mut rt = MpiRuntime::with_library("/nonexistent/libmpi-test.so");
        match rt.bootstrap() {
            Err(RuntimeError::LibraryNotFound { tried }) => {
                assert_eq!(tried.len(), 1);
                assert!(tried[0].starts_with("/nonexistent/libmpi-test.so"));
            }
            other => panic!("expected LibraryNotFound, got {other:?}"),
        }
        // Nothing was loaded, so there is nothing to tear down.
        assert_eq!(rt.teardown(), Ok(()));
    }

    #[cfg(unix)]
    #[test]
    fn finalized_runtime_is_not_restarted() {
        reset(false);
        let mut rt = fake_runtime();
        assert_eq!(rt.bootstrap(), Ok(Some(Communicator(0))));
        assert_eq!(rt.teardown(), Ok(()));
        assert!(FINALIZED.get());

        // MPI_Init after MPI_Finalize is erroneous; refuse before calling it.
        assert_eq!(rt.bootstrap(), Err(RuntimeError::NotRestartable));
        assert_eq!(INIT_CALLS.get(), 1);

        // A fresh runtime in the same process sees the same state.
        assert_eq!(fake_runtime().bootstrap(), Err(RuntimeError::NotRestartable));
    }

    #[cfg(unix)]
    #[test]
    fn host_owned_runtime_is_adopted_and_left_running() {
        reset(true);
        let mut rt = fake_runtime();
        assert_eq!(rt.bootstrap(), Ok(Some(Communicator(0))));
        assert_eq!(rt.teardown(), Ok(()));
        assert_eq!(INIT_CALLS.get(), 0);
        assert!(!FINALIZED.get());
    }
}
