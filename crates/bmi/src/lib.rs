//! BMI: a Basic Model Interface coupling adapter for timestep-driven
//! simulation engines.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! BMI sub-crates. For most users, adding `bmi` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use bmi::prelude::*;
//! use bmi::hydro::names::{PRECIPITATION, STREAMFLOW};
//!
//! let mut model = Adapter::builder(Box::new(HydroEngine::new()))
//!     .slot(EngineSlot::leaked())
//!     .build()
//!     .unwrap();
//! model.register().unwrap();
//! model
//!     .initialize("&hydro_nlist\n nx = 4\n ny = 3\n time_step = 3600.0\n/\n")
//!     .unwrap();
//!
//! let rain = vec![0.05f64; 12];
//! model.set_value(PRECIPITATION, rain.as_slice().into()).unwrap();
//! model.update().unwrap();
//! assert_eq!(model.current_time().unwrap(), 3600.0);
//!
//! let flow: Vec<f64> = model.get_value_vec(STREAMFLOW).unwrap();
//! assert!(flow.iter().all(|q| *q >= 0.0));
//! model.finalize().unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `bmi-core` | Value types, layouts, native arrays, variable definitions, config |
//! | [`catalog`] | `bmi-catalog` | Variable catalog, grids and topologies |
//! | [`engine`] | `bmi-engine` | The `Engine` trait engines implement |
//! | [`adapter`] | `bmi-adapter` | Lifecycle, clock, marshalling, parallel runtime bridge |
//! | [`hydro`] | `bmi-hydro` | Reference hydrology engine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`bmi-core`).
///
/// Contains [`types::ValueType`], [`types::Layout`], the native array
/// views engines expose, variable definitions and [`types::InitConfig`].
pub use bmi_core as types;

/// Variable and grid metadata (`bmi-catalog`).
///
/// [`catalog::Catalog`] answers every metadata query; [`catalog::Grid`]
/// describes one grid and rejects queries its topology does not support.
pub use bmi_catalog as catalog;

/// The engine contract (`bmi-engine`).
///
/// Implement [`engine::Engine`] to put a model behind the adapter.
pub use bmi_engine as engine;

/// The coupling adapter (`bmi-adapter`).
///
/// [`adapter::Adapter`] is the BMI session; [`adapter::MpiRuntime`]
/// bootstraps MPI for engines that need it.
pub use bmi_adapter as adapter;

/// Reference hydrology engine (`bmi-hydro`).
pub use bmi_hydro as hydro;

/// Common imports for typical BMI usage.
///
/// ```rust
/// use bmi::prelude::*;
/// ```
///
/// This imports the adapter and its builder, the engine trait, the value
/// and metadata types used in calls, and the error types.
pub mod prelude {
    // Adapter
    pub use bmi_adapter::{Adapter, AdapterBuilder, EngineSlot, LifecycleState, MpiRuntime};

    // Engine contract
    pub use bmi_engine::{ClockSpec, Domain, Engine, InitContext, RuntimeRequirement};

    // Values and metadata
    pub use bmi_catalog::{Grid, GridKind, Mesh};
    pub use bmi_core::{
        Communicator, Element, GridId, InitConfig, Layout, Location, ValueSlice, ValueSliceMut,
        ValueType, VarRole, VariableDef,
    };

    // Errors
    pub use bmi_adapter::{AdapterError, RuntimeError};
    pub use bmi_catalog::CatalogError;
    pub use bmi_core::{ConfigError, EngineError};

    // Reference engine
    pub use bmi_hydro::HydroEngine;
}
