//! Exchange-item names and grid ids of the reference hydrology model.

use bmi_core::{GridId, ValueType, VariableDef};

/// Rainfall rate, accumulated between steps.
pub const PRECIPITATION: &str = "atmosphere_water__precipitation_leq-volume_flux";
/// Near-surface air temperature, forced at the coupling interval.
pub const AIR_TEMPERATURE: &str = "land_surface_air__temperature";
/// Parallel communicator handle.
pub const COMM: &str = "bmi_mpi_comm_handle";
/// Streamflow per channel link at the current time level.
pub const STREAMFLOW: &str = "channel_water__volume_flow_rate";
/// One-based channel link ids.
pub const LINK_ID: &str = "channel_link__identification_number";
/// Ponded water on the routing grid.
pub const SURFACE_WATER_DEPTH: &str = "land_surface_water__depth";
/// Top-layer soil moisture.
pub const SOIL_MOISTURE: &str = "soil_water__volume_fraction";
/// Snow water equivalent.
pub const SNOW_DEPTH: &str = "snowpack__liquid-equivalent_depth";
/// Infiltration excess leaving each land cell.
pub const RUNOFF: &str = "land_surface_water__runoff_volume_flux";
/// Streamflow sampled at the outlet gauges.
pub const GAUGE_FLOW: &str = "gauge_water__volume_flow_rate";

/// Land surface grid, `[ny, nx]`.
pub const GRID_LAND: GridId = GridId(0);
/// Refined surface routing grid.
pub const GRID_ROUTING: GridId = GridId(1);
/// Channel network: one node per link.
pub const GRID_CHANNEL: GridId = GridId(2);
/// Outlet gauges.
pub const GRID_GAUGES: GridId = GridId(3);
/// Single value.
pub const GRID_SCALAR: GridId = GridId(4);

/// The catalog of the hydrology model, inputs first.
pub fn hydro_variables() -> Vec<VariableDef> {
    vec![
        VariableDef::input(PRECIPITATION, ValueType::Float64, "mm s-1", GRID_LAND).accumulating(),
        VariableDef::input(AIR_TEMPERATURE, ValueType::Float64, "K", GRID_LAND),
        VariableDef::communicator(COMM, GRID_SCALAR),
        VariableDef::output(STREAMFLOW, ValueType::Float64, "m3 s-1", GRID_CHANNEL),
        VariableDef::output(LINK_ID, ValueType::Int32, "1", GRID_CHANNEL),
        VariableDef::output(SURFACE_WATER_DEPTH, ValueType::Float64, "m", GRID_ROUTING),
        VariableDef::output(SOIL_MOISTURE, ValueType::Float64, "1", GRID_LAND),
        VariableDef::output(SNOW_DEPTH, ValueType::Float64, "m", GRID_LAND),
        VariableDef::output(RUNOFF, ValueType::Float64, "m s-1", GRID_LAND),
        VariableDef::output(GAUGE_FLOW, ValueType::Float64, "m3 s-1", GRID_GAUGES),
    ]
}
