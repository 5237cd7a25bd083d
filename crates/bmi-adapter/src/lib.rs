//! BMI coupling adapter.
//!
//! Wraps a timestep-driven [`Engine`](bmi_engine::Engine) behind the
//! Basic Model Interface: a five-state lifecycle, metadata queries, a
//! session clock and typed value exchange. Engines that are MPI programs
//! get their runtime bootstrapped before initialization and torn down
//! after finalization, once per process.
//!
//! The entry point is [`Adapter`]; see [`AdapterBuilder`] to pick a
//! runtime or an isolated [`EngineSlot`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod bridge;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod marshal;
pub mod slot;

pub use adapter::{Adapter, AdapterBuilder};
pub use bridge::{MpiFlavour, MpiRuntime, ParallelRuntime, ProcessBridge, SerialRuntime};
pub use clock::SessionClock;
pub use error::{AdapterError, MarshalError, RuntimeError};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use slot::{EngineSlot, SlotClaim};
