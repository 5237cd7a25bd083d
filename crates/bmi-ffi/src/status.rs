//! C-compatible status codes.
//!
//! [`BmiStatus`] is a `repr(i32)` enum covering every failure the adapter
//! can report. Conversions from [`AdapterError`] keep engine failures
//! distinct from malformed calls.

use bmi_adapter::AdapterError;
use bmi_catalog::CatalogError;
use bmi_core::EngineError;

/// C-compatible status code returned by all FFI functions.
///
/// `Success` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BmiStatus {
    /// Success.
    Success = 0,
    /// Operation not valid in the current lifecycle state.
    ProtocolError = -1,
    /// `initialize` called twice.
    AlreadyInitialized = -2,
    /// The instance has been finalized.
    AlreadyFinalized = -3,
    /// Another instance holds the engine.
    SingletonViolation = -4,
    /// Malformed or missing configuration.
    ConfigurationError = -5,
    /// Name not in the catalog.
    UnknownVariable = -6,
    /// Grid id not reported by the engine.
    UnknownGrid = -7,
    /// The grid's topology has no such property.
    GridCapabilityUnsupported = -8,
    /// Caller buffer length differs from the variable size.
    BufferSizeMismatch = -9,
    /// Caller buffer element type differs from the variable type.
    TypeMismatch = -10,
    /// Write to an output-only variable.
    AccessViolation = -11,
    /// The engine failed to initialize.
    EngineInitFailed = -12,
    /// The engine failed during a step.
    EngineStepFailed = -13,
    /// The engine failed during teardown.
    EngineFinalizeFailed = -14,
    /// The engine could not expose its storage.
    EngineInternalError = -15,
    /// The parallel runtime could not be started or stopped.
    RuntimeBridgeFailed = -16,
    /// Target time outside the model's time axis.
    InvalidTime = -17,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -18,
    /// Caller-provided buffer is too small.
    BufferTooSmall = -19,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -20,
    /// An index is outside the variable.
    IndexOutOfRange = -21,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl BmiStatus {
    /// Every status, in code order.
    pub const ALL: [BmiStatus; 23] = [
        Self::Success,
        Self::ProtocolError,
        Self::AlreadyInitialized,
        Self::AlreadyFinalized,
        Self::SingletonViolation,
        Self::ConfigurationError,
        Self::UnknownVariable,
        Self::UnknownGrid,
        Self::GridCapabilityUnsupported,
        Self::BufferSizeMismatch,
        Self::TypeMismatch,
        Self::AccessViolation,
        Self::EngineInitFailed,
        Self::EngineStepFailed,
        Self::EngineFinalizeFailed,
        Self::EngineInternalError,
        Self::RuntimeBridgeFailed,
        Self::InvalidTime,
        Self::InvalidArgument,
        Self::BufferTooSmall,
        Self::InternalError,
        Self::IndexOutOfRange,
        Self::Panicked,
    ];

    /// Look up a raw code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| *s as i32 == code)
    }

    /// Stable upper-snake name, e.g. `"BMI_UNKNOWN_VARIABLE"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "BMI_SUCCESS",
            Self::ProtocolError => "BMI_PROTOCOL_ERROR",
            Self::AlreadyInitialized => "BMI_ALREADY_INITIALIZED",
            Self::AlreadyFinalized => "BMI_ALREADY_FINALIZED",
            Self::SingletonViolation => "BMI_SINGLETON_VIOLATION",
            Self::ConfigurationError => "BMI_CONFIGURATION_ERROR",
            Self::UnknownVariable => "BMI_UNKNOWN_VARIABLE",
            Self::UnknownGrid => "BMI_UNKNOWN_GRID",
            Self::GridCapabilityUnsupported => "BMI_GRID_CAPABILITY_UNSUPPORTED",
            Self::BufferSizeMismatch => "BMI_BUFFER_SIZE_MISMATCH",
            Self::TypeMismatch => "BMI_TYPE_MISMATCH",
            Self::AccessViolation => "BMI_ACCESS_VIOLATION",
            Self::EngineInitFailed => "BMI_ENGINE_INIT_FAILED",
            Self::EngineStepFailed => "BMI_ENGINE_STEP_FAILED",
            Self::EngineFinalizeFailed => "BMI_ENGINE_FINALIZE_FAILED",
            Self::EngineInternalError => "BMI_ENGINE_INTERNAL_ERROR",
            Self::RuntimeBridgeFailed => "BMI_RUNTIME_BRIDGE_FAILED",
            Self::InvalidTime => "BMI_INVALID_TIME",
            Self::InvalidArgument => "BMI_INVALID_ARGUMENT",
            Self::BufferTooSmall => "BMI_BUFFER_TOO_SMALL",
            Self::InternalError => "BMI_INTERNAL_ERROR",
            Self::IndexOutOfRange => "BMI_INDEX_OUT_OF_RANGE",
            Self::Panicked => "BMI_PANICKED",
        }
    }
}

impl From<&EngineError> for BmiStatus {
    fn from(e: &EngineError) -> Self {
        match e {
            EngineError::InitFailed { .. } => BmiStatus::EngineInitFailed,
            EngineError::StepFailed { .. } => BmiStatus::EngineStepFailed,
            EngineError::FinalizeFailed { .. } => BmiStatus::EngineFinalizeFailed,
            EngineError::UnknownArray { .. } | EngineError::Storage { .. } => {
                BmiStatus::EngineInternalError
            }
        }
    }
}

impl From<&CatalogError> for BmiStatus {
    fn from(e: &CatalogError) -> Self {
        match e {
            CatalogError::UnknownVariable { .. } => BmiStatus::UnknownVariable,
            CatalogError::UnknownGrid { .. } => BmiStatus::UnknownGrid,
            CatalogError::GridCapabilityUnsupported { .. } => BmiStatus::GridCapabilityUnsupported,
            CatalogError::GridsNotReady => BmiStatus::ProtocolError,
            // The rest describe a malformed engine table or domain.
            CatalogError::DuplicateVariable { .. }
            | CatalogError::InvalidVariable { .. }
            | CatalogError::DuplicateGrid { .. }
            | CatalogError::MissingGrid { .. }
            | CatalogError::GridsAlreadyInstalled
            | CatalogError::InvalidGrid { .. } => BmiStatus::EngineInitFailed,
        }
    }
}

impl From<&AdapterError> for BmiStatus {
    fn from(e: &AdapterError) -> Self {
        match e {
            AdapterError::Protocol { .. } => BmiStatus::ProtocolError,
            AdapterError::AlreadyInitialized => BmiStatus::AlreadyInitialized,
            AdapterError::AlreadyFinalized => BmiStatus::AlreadyFinalized,
            AdapterError::SingletonViolation => BmiStatus::SingletonViolation,
            AdapterError::Config(_) => BmiStatus::ConfigurationError,
            AdapterError::Catalog(c) => BmiStatus::from(c),
            AdapterError::BufferSizeMismatch { .. } => BmiStatus::BufferSizeMismatch,
            AdapterError::TypeMismatch { .. } => BmiStatus::TypeMismatch,
            AdapterError::ReadOnly { .. } => BmiStatus::AccessViolation,
            AdapterError::IndexOutOfRange { .. } => BmiStatus::IndexOutOfRange,
            AdapterError::InvalidTime { .. } => BmiStatus::InvalidTime,
            AdapterError::InvalidDomain { .. } => BmiStatus::EngineInitFailed,
            AdapterError::Engine(e) => BmiStatus::from(e),
            AdapterError::Runtime(_) => BmiStatus::RuntimeBridgeFailed,
            AdapterError::StorageMismatch { .. } => BmiStatus::EngineInternalError,
        }
    }
}

impl From<AdapterError> for BmiStatus {
    fn from(e: AdapterError) -> Self {
        BmiStatus::from(&e)
    }
}

impl From<CatalogError> for BmiStatus {
    fn from(e: CatalogError) -> Self {
        BmiStatus::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmi_adapter::{LifecycleState, MarshalError, RuntimeError};
    use bmi_catalog::GridCapability;
    use bmi_core::{ConfigError, GridId};

    #[test]
    fn status_code_values_are_stable() {
        let codes: Vec<i32> = BmiStatus::ALL.iter().map(|s| *s as i32).collect();
        let mut expected: Vec<i32> = (-21..=0).rev().collect();
        expected.push(-128);
        assert_eq!(codes, expected);
    }

    #[test]
    fn codes_round_trip_through_lookup() {
        for status in BmiStatus::ALL {
            assert_eq!(BmiStatus::from_code(status as i32), Some(status));
        }
        assert_eq!(BmiStatus::from_code(-22), None);
        assert_eq!(BmiStatus::from_code(1), None);
    }

    #[test]
    fn names_are_distinct() {
        let mut names: Vec<&str> = BmiStatus::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BmiStatus::ALL.len());
    }

    #[test]
    fn engine_failures_stay_distinct() {
        let cases = [
            (EngineError::init("x"), BmiStatus::EngineInitFailed),
            (EngineError::step("x"), BmiStatus::EngineStepFailed),
            (
                EngineError::FinalizeFailed {
                    code: 1,
                    reason: "x".into(),
                },
                BmiStatus::EngineFinalizeFailed,
            ),
            (
                EngineError::UnknownArray { name: "x".into() },
                BmiStatus::EngineInternalError,
            ),
        ];
        for (e, status) in cases {
            assert_eq!(BmiStatus::from(&AdapterError::Engine(e)), status);
        }
    }

    #[test]
    fn adapter_error_to_status() {
        assert_eq!(
            BmiStatus::from(&AdapterError::Protocol {
                op: "update",
                state: LifecycleState::Registered
            }),
            BmiStatus::ProtocolError
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::Config(ConfigError::Empty)),
            BmiStatus::ConfigurationError
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::ReadOnly { name: "q".into() }),
            BmiStatus::AccessViolation
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::Catalog(CatalogError::GridsNotReady)),
            BmiStatus::ProtocolError
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::Catalog(CatalogError::UnknownGrid { grid: GridId(9) })),
            BmiStatus::UnknownGrid
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::Catalog(
                CatalogError::GridCapabilityUnsupported {
                    grid: GridId(0),
                    capability: GridCapability::Shape,
                }
            )),
            BmiStatus::GridCapabilityUnsupported
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::InvalidDomain {
                reason: "dt".into()
            }),
            BmiStatus::EngineInitFailed
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::Runtime(RuntimeError::AlreadyTornDown)),
            BmiStatus::RuntimeBridgeFailed
        );
        assert_eq!(
            BmiStatus::from(&AdapterError::StorageMismatch {
                name: "q".into(),
                source: MarshalError::Length {
                    native: 2,
                    exposed: 3
                },
            }),
            BmiStatus::EngineInternalError
        );
    }
}
