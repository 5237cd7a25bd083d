//! Metadata catalog for the BMI coupling adapter.
//!
//! Answers introspection queries about exchangeable variables and the
//! grids they live on, without touching engine state. Variables are known
//! from construction; grids are installed once the engine has read its
//! domain, and every grid query fails until then.
//!
//! Lookup is a flat name-keyed table. Topology-specific grid data is a
//! tagged union ([`Topology`]); queries that do not apply to a grid's
//! topology fail with [`CatalogError::GridCapabilityUnsupported`] rather
//! than returning empty output.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod grid;
pub mod topology;

pub use catalog::Catalog;
pub use error::{CatalogError, GridCapability, GridError};
pub use grid::Grid;
pub use topology::{GridKind, Mesh, Topology};
