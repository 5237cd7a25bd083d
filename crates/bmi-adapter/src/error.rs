//! Error types for the adapter, the process bridge and marshaling.

use std::error::Error;
use std::fmt;

use bmi_catalog::CatalogError;
use bmi_core::{ConfigError, EngineError, ValueType};

use crate::lifecycle::LifecycleState;

// ── RuntimeError ───────────────────────────────────────────────────

/// Failures of the process lifecycle bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    /// No candidate shared library could be opened.
    LibraryNotFound {
        /// Every path or soname tried, with its loader message.
        tried: Vec<String>,
    },
    /// The library lacks a required entry point.
    MissingSymbol {
        /// The symbol name.
        symbol: &'static str,
        /// Loader message.
        reason: String,
    },
    /// A runtime call returned a non-success code.
    CallFailed {
        /// The function called.
        function: &'static str,
        /// Its return code.
        code: i32,
    },
    /// The runtime was bootstrapped already in this process.
    AlreadyBootstrapped,
    /// The runtime was torn down already; it cannot be restarted.
    AlreadyTornDown,
    /// Something else in the process finalized the runtime first.
    FinalizedElsewhere,
    /// The runtime was finalized earlier in this process and cannot be
    /// initialized again.
    NotRestartable,
    /// This platform has no dynamic loader for the runtime.
    Unsupported {
        /// The runtime name.
        runtime: &'static str,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LibraryNotFound { tried } => {
                write!(f, "no runtime library found (tried {})", tried.join("; "))
            }
            Self::MissingSymbol { symbol, reason } => {
                write!(f, "runtime library lacks {symbol}: {reason}")
            }
            Self::CallFailed { function, code } => write!(f, "{function} failed with code {code}"),
            Self::AlreadyBootstrapped => write!(f, "runtime already bootstrapped"),
            Self::AlreadyTornDown => write!(f, "runtime already torn down"),
            Self::FinalizedElsewhere => write!(f, "runtime finalized outside the adapter"),
            Self::NotRestartable => write!(f, "runtime already finalized in this process"),
            Self::Unsupported { runtime } => {
                write!(f, "{runtime} runtime unsupported on this platform")
            }
        }
    }
}

impl Error for RuntimeError {}

// ── MarshalError ───────────────────────────────────────────────────

/// A native array disagrees with the buffer it is exchanged with.
///
/// The adapter validates buffers against the catalog first, so these
/// only surface when an engine's storage contradicts its own metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarshalError {
    /// No conversion between the native and exposed element types.
    Conversion {
        /// Native storage type.
        native: ValueType,
        /// Caller buffer type.
        exposed: ValueType,
    },
    /// Native element count differs from the buffer length.
    Length {
        /// Native element count.
        native: usize,
        /// Caller buffer length.
        exposed: usize,
    },
    /// A flat index lies past the native array.
    Index {
        /// The index.
        index: usize,
        /// Native element count.
        len: usize,
    },
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion { native, exposed } => {
                write!(f, "cannot exchange {native} storage as {exposed}")
            }
            Self::Length { native, exposed } => {
                write!(f, "native array holds {native} elements, buffer {exposed}")
            }
            Self::Index { index, len } => write!(f, "index {index} outside native array of {len}"),
        }
    }
}

impl Error for MarshalError {}

// ── AdapterError ───────────────────────────────────────────────────

/// Every failure an adapter operation can report.
///
/// Validation variants are returned before the engine is touched; the
/// [`Engine`](AdapterError::Engine) variant carries the engine's own
/// failure unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum AdapterError {
    /// The operation is not legal in the current lifecycle state.
    Protocol {
        /// The operation attempted.
        op: &'static str,
        /// The state it was attempted in.
        state: LifecycleState,
    },
    /// The session is already initialized.
    AlreadyInitialized,
    /// The session is finalized; instances are not reusable.
    AlreadyFinalized,
    /// Another live instance holds the process-wide slot.
    SingletonViolation,
    /// The configuration descriptor is invalid.
    Config(ConfigError),
    /// A metadata lookup failed.
    Catalog(CatalogError),
    /// Caller buffer length differs from what the variable requires.
    BufferSizeMismatch {
        /// The variable.
        name: String,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// Caller buffer type differs from the variable's type.
    TypeMismatch {
        /// The variable.
        name: String,
        /// The variable's type.
        expected: ValueType,
        /// The buffer's type.
        actual: ValueType,
    },
    /// `set_value` on an output variable.
    ReadOnly {
        /// The variable.
        name: String,
    },
    /// A flat index is not below the variable's grid size.
    IndexOutOfRange {
        /// The variable.
        name: String,
        /// The offending index.
        index: i64,
        /// The grid size.
        size: usize,
    },
    /// A requested target time is unreachable.
    InvalidTime {
        /// The requested time.
        requested: f64,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The engine reported a grid or clock the adapter cannot use.
    InvalidDomain {
        /// What was wrong.
        reason: String,
    },
    /// The wrapped engine failed.
    Engine(EngineError),
    /// The process lifecycle bridge failed.
    Runtime(RuntimeError),
    /// Engine storage contradicts the engine's own metadata.
    StorageMismatch {
        /// The variable.
        name: String,
        /// What disagreed.
        source: MarshalError,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol { op, state } => write!(f, "{op} not allowed while {state}"),
            Self::AlreadyInitialized => write!(f, "already initialized"),
            Self::AlreadyFinalized => write!(f, "already finalized"),
            Self::SingletonViolation => {
                write!(f, "another engine instance is live in this process")
            }
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Catalog(e) => write!(f, "{e}"),
            Self::BufferSizeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "buffer for '{name}' has {actual} elements, expected {expected}"
            ),
            Self::TypeMismatch {
                name,
                expected,
                actual,
            } => write!(f, "'{name}' is {expected}, buffer is {actual}"),
            Self::ReadOnly { name } => write!(f, "'{name}' is an output and read-only"),
            Self::IndexOutOfRange { name, index, size } => {
                write!(f, "index {index} out of range for '{name}' (size {size})")
            }
            Self::InvalidTime { requested, reason } => {
                write!(f, "invalid time {requested}: {reason}")
            }
            Self::InvalidDomain { reason } => write!(f, "invalid engine domain: {reason}"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "parallel runtime: {e}"),
            Self::StorageMismatch { name, source } => {
                write!(f, "storage for '{name}' is inconsistent: {source}")
            }
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Engine(e) => Some(e),
            Self::Runtime(e) => Some(e),
            Self::StorageMismatch { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for AdapterError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CatalogError> for AdapterError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

impl From<EngineError> for AdapterError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<RuntimeError> for AdapterError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}
