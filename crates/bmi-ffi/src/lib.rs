//! C FFI bindings for the BMI coupling adapter.
//!
//! Exposes the BMI operation set as `extern "C"` functions over a single
//! process-wide adapter instance. Every function returns a [`BmiStatus`]
//! code; results go through out-parameters, which are left untouched on
//! failure. The header is generated into `include/bmi.h` at build time.
//!
//! This crate is one of two that may contain `unsafe` code (along with
//! `bmi-adapter`, for the MPI loader).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, turning a panic into [`BmiStatus::Panicked`].
///
/// The body evaluates to an `i32` status and may `return` early.
macro_rules! ffi_guard {
    ($body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(status) => status,
            Err(_) => {
                ::tracing::warn!("panic caught at the C boundary");
                $crate::status::BmiStatus::Panicked as i32
            }
        }
    };
}

/// Lock a mutex, returning [`BmiStatus::InternalError`] if poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::BmiStatus::InternalError as i32,
        }
    };
}

mod buffer;
pub mod control;
pub mod grid;
pub mod info;
pub mod instance;
pub mod status;
pub mod time;
pub mod value;

pub use instance::{install_engine, EngineFactory};
pub use status::BmiStatus;
