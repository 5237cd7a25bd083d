//! The [`Engine`] trait wrapped by the BMI coupling adapter.
//!
//! An engine is a timestep-driven simulation that owns its state arrays.
//! The adapter drives it through three lifecycle calls and borrows its
//! arrays by name for the duration of each data exchange.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod domain;
pub mod engine;

pub use domain::{ClockSpec, Domain};
pub use engine::{Engine, InitContext, RuntimeRequirement};
