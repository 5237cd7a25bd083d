//! Error types shared across the workspace.
//!
//! Configuration errors live next to the parser in [`crate::config`];
//! catalog and adapter errors live in their own crates.

use std::error::Error;
use std::fmt;

/// A [`Layout`](crate::Layout) that cannot describe the given storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// `shape` and `strides` have different lengths.
    RankMismatch {
        /// Length of `shape`.
        shape: usize,
        /// Length of `strides`.
        strides: usize,
    },
    /// Some element would fall outside the backing buffer.
    OutOfBounds {
        /// Smallest buffer length the layout needs.
        required: usize,
        /// Actual buffer length.
        available: usize,
    },
    /// Some element would sit before the start of the buffer.
    NegativeOffset,
    /// `select` on an axis the layout does not have.
    AxisOutOfRange {
        /// Requested axis.
        axis: usize,
        /// Layout rank.
        rank: usize,
    },
    /// `select` of an index past the axis extent.
    IndexOutOfRange {
        /// Selected axis.
        axis: usize,
        /// Requested index.
        index: usize,
        /// Axis extent.
        extent: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankMismatch { shape, strides } => {
                write!(f, "shape has {shape} axes but strides has {strides}")
            }
            Self::OutOfBounds {
                required,
                available,
            } => write!(
                f,
                "layout needs {required} elements but buffer holds {available}"
            ),
            Self::NegativeOffset => write!(f, "layout reaches before the buffer start"),
            Self::AxisOutOfRange { axis, rank } => {
                write!(f, "axis {axis} out of range for rank {rank}")
            }
            Self::IndexOutOfRange {
                axis,
                index,
                extent,
            } => write!(f, "index {index} out of range for axis {axis} (extent {extent})"),
        }
    }
}

impl Error for LayoutError {}

/// Failures surfaced by the wrapped engine.
///
/// The adapter passes these through as distinct statuses so callers can
/// tell "the call was malformed" from "the simulation failed". `code` is
/// the engine's own error code, zero when it has none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The engine rejected its configuration or domain.
    InitFailed {
        /// Engine-specific code.
        code: i32,
        /// Human-readable description.
        reason: String,
    },
    /// One physics step failed.
    StepFailed {
        /// Engine-specific code.
        code: i32,
        /// Human-readable description.
        reason: String,
    },
    /// Engine teardown failed.
    FinalizeFailed {
        /// Engine-specific code.
        code: i32,
        /// Human-readable description.
        reason: String,
    },
    /// The engine holds no storage under a catalog name.
    UnknownArray {
        /// The requested name.
        name: String,
    },
    /// Storage exists but cannot be exposed (not allocated yet, bad layout).
    Storage {
        /// The requested name.
        name: String,
        /// Human-readable description.
        reason: String,
    },
}

impl EngineError {
    /// Shorthand for [`EngineError::InitFailed`] with code 0.
    pub fn init(reason: impl Into<String>) -> Self {
        Self::InitFailed {
            code: 0,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`EngineError::StepFailed`] with code 0.
    pub fn step(reason: impl Into<String>) -> Self {
        Self::StepFailed {
            code: 0,
            reason: reason.into(),
        }
    }

    /// Wrap a [`LayoutError`] raised while exposing `name`.
    pub fn layout(name: &str, err: LayoutError) -> Self {
        Self::Storage {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed { code, reason } => {
                write!(f, "engine init failed (code {code}): {reason}")
            }
            Self::StepFailed { code, reason } => {
                write!(f, "engine step failed (code {code}): {reason}")
            }
            Self::FinalizeFailed { code, reason } => {
                write!(f, "engine finalize failed (code {code}): {reason}")
            }
            Self::UnknownArray { name } => write!(f, "engine has no array for '{name}'"),
            Self::Storage { name, reason } => write!(f, "storage for '{name}': {reason}"),
        }
    }
}

impl Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display_carries_code() {
        let err = EngineError::StepFailed {
            code: 7,
            reason: "CFL violated".into(),
        };
        assert_eq!(err.to_string(), "engine step failed (code 7): CFL violated");
    }

    #[test]
    fn layout_error_wraps_into_storage() {
        let err = EngineError::layout(
            "x",
            LayoutError::OutOfBounds {
                required: 10,
                available: 4,
            },
        );
        match err {
            EngineError::Storage { name, reason } => {
                assert_eq!(name, "x");
                assert!(reason.contains("10"));
            }
            other => panic!("expected Storage, got {other:?}"),
        }
    }
}
