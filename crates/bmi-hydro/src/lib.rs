//! Reference hydrology engine for the BMI coupling adapter.
//!
//! [`HydroEngine`] is a small but complete model that exercises every
//! adapter path a real land-surface code does:
//!
//! - Fortran-ordered state arrays exposed through strided views
//! - single-precision storage behind double-precision exchange items
//! - a two-time-level streamflow array, of which only one level is visible
//! - an accumulating precipitation input and a two-timepoint forcing input
//! - rectilinear, unstructured, point and scalar grids
//! - an optional MPI runtime requirement ([`HydroEngine::parallel`])
//!
//! The domain (terrain and channel network) is generated from a seed, see
//! [`terrain`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod engine;
pub mod names;
pub mod params;
pub mod terrain;

pub use engine::HydroEngine;
pub use names::hydro_variables;
pub use params::HydroParams;
pub use terrain::Terrain;

const _: () = {
    fn _assert_send<T: Send>() {}
    fn _check() {
        _assert_send::<HydroEngine>();
    }
};
