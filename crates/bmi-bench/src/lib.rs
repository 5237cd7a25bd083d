//! Benchmark profiles for the BMI coupling adapter.
//!
//! Provides initialized hydrology sessions for benchmarking and examples:
//!
//! - [`reference_profile`]: 100x100 land grid, routing factor 4 (160K routing cells)
//! - [`stress_profile`]: 316x316 land grid (~100K land cells)
//! - [`namelist`]: the configuration text both are built from

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use bmi_adapter::{Adapter, AdapterError, EngineSlot};
use bmi_hydro::HydroEngine;

/// Namelist for an `nx` by `ny` land grid, hourly steps over ten days.
pub fn namelist(nx: usize, ny: usize, seed: u64) -> String {
    format!(
        "&hydro_nlist\n  nx = {nx}\n  ny = {ny}\n  dx = 250.0\n  routing_factor = 4\n  \
         start_time = 0.0\n  end_time = 864000.0\n  time_step = 3600.0\n  seed = {seed}\n/\n"
    )
}

/// An initialized session on its own slot, so benches never contend.
pub fn session(nx: usize, ny: usize, seed: u64) -> Result<Adapter, AdapterError> {
    let mut adapter = Adapter::builder(Box::new(HydroEngine::new()))
        .slot(EngineSlot::leaked())
        .build()?;
    adapter.register()?;
    adapter.initialize(&namelist(nx, ny, seed))?;
    Ok(adapter)
}

/// 100x100 land cells (10K).
pub fn reference_profile(seed: u64) -> Result<Adapter, AdapterError> {
    session(100, 100, seed)
}

/// 316x316 land cells (~100K), same physics as [`reference_profile`].
pub fn stress_profile(seed: u64) -> Result<Adapter, AdapterError> {
    session(316, 316, seed)
}

/// A uniform precipitation field for an `nx` by `ny` grid, in mm s-1.
pub fn uniform_rain(nx: usize, ny: usize, rate: f64) -> Vec<f64> {
    vec![rate; nx * ny]
}
