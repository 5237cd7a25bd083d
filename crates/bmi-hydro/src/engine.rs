//! The reference hydrology engine.
//!
//! A bucket model on a rectangular land grid: rain falls as snow below
//! freezing, melts above it, infiltrates the top soil layer up to its
//! remaining pore space and drains downward; the excess runs off into a
//! refined routing grid and into the channel link the cell drains to.
//! Channel links pass flow downstream each step.
//!
//! State is stored the way a Fortran model stores it: land arrays are
//! column-major `[nx, ny]`, soil moisture is `[nx, nsoil, ny]` and
//! streamflow keeps two time levels in `[nlinks, 2]`. The adapter sees
//! C-ordered views of them through [`Layout`].

use bmi_catalog::{CatalogError, Grid, Mesh};
use bmi_core::{
    EngineError, ForcingPair, Layout, LayoutError, NativeArray, NativeArrayMut, NativeData,
    NativeDataMut, VariableDef,
};
use bmi_engine::{ClockSpec, Domain, Engine, InitContext, RuntimeRequirement};
use tracing::{debug, info};

use crate::names::*;
use crate::params::{HydroParams, SOIL_LAYER_DEPTHS};
use crate::terrain::{Terrain, MAX_ELEVATION};

const COMPONENT_NAME: &str = "Hydro Reference Model v1.0";

/// Freezing point in kelvin.
pub const FREEZING: f64 = 273.15;
/// Air temperature before any forcing is written.
pub const INITIAL_AIR_TEMPERATURE: f64 = 280.0;
/// Soil moisture of every layer at start.
pub const INITIAL_SOIL_MOISTURE: f32 = 0.25;
/// Saturated volume fraction.
pub const POROSITY: f64 = 0.45;
/// Degree-day melt rate, metres per second per kelvin.
pub const MELT_FACTOR: f64 = 3.0e-8;
/// Fraction of a layer's water that drains per second.
pub const DRAINAGE_RATE: f64 = 1.0e-6;
/// Fraction of ponded water left after one step.
pub const PONDING_RECESSION: f32 = 0.5;
/// Fraction of a link's flow retained from the previous step.
pub const CHANNEL_STORAGE: f64 = 0.5;

const NSOIL: usize = SOIL_LAYER_DEPTHS.len();

/// Reference hydrology engine.
///
/// Construction only records the runtime requirement; the domain is read
/// and allocated in [`Engine::initialize`].
#[derive(Debug, Default)]
pub struct HydroEngine {
    requirement: RuntimeRequirement,
    state: Option<HydroState>,
}

/// Views of native arrays in canonical order.
#[derive(Debug)]
struct Layouts {
    land: Layout,
    routing: Layout,
    soil_top: Layout,
    streamflow: Layout,
}

#[derive(Debug)]
struct HydroState {
    params: HydroParams,
    terrain: Terrain,
    outlets: Vec<usize>,
    layouts: Layouts,
    now: f64,
    steps: u64,
    precipitation: Vec<f64>,
    air_temperature: ForcingPair,
    snow: Vec<f64>,
    runoff: Vec<f64>,
    soil: Vec<f32>,
    surface_depth: Vec<f32>,
    streamflow: Vec<f32>,
    link_id: Vec<i32>,
    gauge_flow: Vec<f64>,
}

impl HydroEngine {
    /// A serial engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that asks for the MPI runtime before initializing.
    pub fn parallel() -> Self {
        Self {
            requirement: RuntimeRequirement::Parallel,
            state: None,
        }
    }

    /// Resolved parameters, once initialized.
    pub fn params(&self) -> Option<&HydroParams> {
        self.state.as_ref().map(|s| &s.params)
    }

    /// Generated terrain, once initialized.
    pub fn terrain(&self) -> Option<&Terrain> {
        self.state.as_ref().map(|s| &s.terrain)
    }

    fn state(&self, name: &str) -> Result<&HydroState, EngineError> {
        self.state.as_ref().ok_or_else(|| not_allocated(name))
    }
}

impl Engine for HydroEngine {
    fn component_name(&self) -> &str {
        COMPONENT_NAME
    }

    fn variables(&self) -> Vec<VariableDef> {
        hydro_variables()
    }

    fn runtime_requirement(&self) -> RuntimeRequirement {
        self.requirement
    }

    fn initialize(&mut self, ctx: &InitContext<'_>) -> Result<Domain, EngineError> {
        let params = HydroParams::from_config(ctx.config).map_err(|e| EngineError::InitFailed {
            code: 2,
            reason: e.to_string(),
        })?;
        let terrain = Terrain::generate(&params);
        let grids = build_grids(&params, &terrain).map_err(|e| EngineError::InitFailed {
            code: 3,
            reason: e.to_string(),
        })?;
        let layouts = build_layouts(&params).map_err(|e| EngineError::InitFailed {
            code: 3,
            reason: e.to_string(),
        })?;
        let clock = ClockSpec::new(
            params.start_time,
            params.end_time,
            params.time_step,
            &params.time_units,
        );

        let cells = params.land_cells();
        let (rnx, rny) = params.routing_extent();
        let outlets = terrain.outlets();
        info!(
            nx = params.nx,
            ny = params.ny,
            nlinks = params.nlinks,
            outlets = outlets.len(),
            seed = params.seed,
            communicator = ?ctx.communicator,
            "hydro domain ready"
        );
        self.state = Some(HydroState {
            now: params.start_time,
            steps: 0,
            precipitation: vec![0.0; cells],
            air_temperature: ForcingPair::new(
                cells,
                INITIAL_AIR_TEMPERATURE,
                params.start_time,
                params.forcing_interval,
            ),
            snow: vec![0.0; cells],
            runoff: vec![0.0; cells],
            soil: vec![INITIAL_SOIL_MOISTURE; cells * NSOIL],
            surface_depth: vec![0.0; rnx * rny],
            streamflow: vec![0.0; params.nlinks * 2],
            link_id: (1..).take(params.nlinks).collect(),
            gauge_flow: vec![0.0; outlets.len()],
            outlets,
            layouts,
            terrain,
            params,
        });
        Ok(Domain { grids, clock })
    }

    fn step(&mut self) -> Result<(), EngineError> {
        let state = self.state.as_mut().ok_or_else(|| EngineError::StepFailed {
            code: 1,
            reason: "engine not initialized".into(),
        })?;
        state.advance()
    }

    fn finalize(&mut self) -> Result<(), EngineError> {
        if let Some(state) = self.state.take() {
            info!(steps = state.steps, time = state.now, "hydro state released");
        }
        Ok(())
    }

    fn read(&self, name: &str) -> Result<NativeArray<'_>, EngineError> {
        let s = self.state(name)?;
        let l = &s.layouts;
        let (data, layout) = match name {
            PRECIPITATION => (NativeData::Float64(&s.precipitation), &l.land),
            AIR_TEMPERATURE => (NativeData::Float64(s.air_temperature.current()), &l.land),
            STREAMFLOW => (NativeData::Float32(&s.streamflow), &l.streamflow),
            LINK_ID => return Ok(NativeArray::contiguous(NativeData::Int32(&s.link_id))),
            SURFACE_WATER_DEPTH => (NativeData::Float32(&s.surface_depth), &l.routing),
            SOIL_MOISTURE => (NativeData::Float32(&s.soil), &l.soil_top),
            SNOW_DEPTH => (NativeData::Float64(&s.snow), &l.land),
            RUNOFF => (NativeData::Float64(&s.runoff), &l.land),
            GAUGE_FLOW => return Ok(NativeArray::contiguous(NativeData::Float64(&s.gauge_flow))),
            _ => return Err(unknown(name)),
        };
        NativeArray::new(data, layout.clone()).map_err(|e| EngineError::layout(name, e))
    }

    fn write_target(&mut self, name: &str) -> Result<NativeArrayMut<'_>, EngineError> {
        let s = self.state.as_mut().ok_or_else(|| not_allocated(name))?;
        let layout = s.layouts.land.clone();
        let data = match name {
            PRECIPITATION => NativeDataMut::Float64(&mut s.precipitation),
            AIR_TEMPERATURE => {
                let now = s.now;
                NativeDataMut::Float64(s.air_temperature.slide_for_write(now))
            }
            _ => return Err(unknown(name)),
        };
        NativeArrayMut::new(data, layout).map_err(|e| EngineError::layout(name, e))
    }
}

impl HydroState {
    fn advance(&mut self) -> Result<(), EngineError> {
        let dt = self.params.time_step;
        let t = self.now + dt;
        if let Some(c) = self.precipitation.iter().position(|p| !p.is_finite()) {
            return Err(self.diverged(format!("non-finite precipitation at cell {c}")));
        }

        let mut air = vec![0.0; self.air_temperature.len()];
        self.air_temperature.interpolate(t, &mut air);
        if let Some(c) = air.iter().position(|v| !v.is_finite()) {
            return Err(self.diverged(format!("non-finite air temperature at cell {c}")));
        }

        let nx = self.params.nx;
        let rf = self.params.routing_factor;
        let (rnx, _) = self.params.routing_extent();
        let cell_area = self.params.dx * self.params.dx;
        let drain = (DRAINAGE_RATE * dt).min(1.0);
        let mut lateral = vec![0.0; self.params.nlinks];

        for c in 0..self.params.land_cells() {
            let (j, i) = (c / nx, c % nx);
            let water = self.precipitation[c].max(0.0) * dt / 1000.0;
            let liquid = if air[c] < FREEZING {
                self.snow[c] += water;
                0.0
            } else {
                let melt = (MELT_FACTOR * (air[c] - FREEZING) * dt).min(self.snow[c]);
                self.snow[c] -= melt;
                water + melt
            };

            let column = |l: usize| i + nx * (l + NSOIL * j);
            let relief = 1.0 - 0.5 * self.terrain.elevation[c] / MAX_ELEVATION;
            let top = column(0);
            let room = (POROSITY - f64::from(self.soil[top])).max(0.0) * SOIL_LAYER_DEPTHS[0];
            let infiltration = liquid.min(room * relief);
            self.soil[top] += (infiltration / SOIL_LAYER_DEPTHS[0]) as f32;
            for l in 0..NSOIL - 1 {
                let (upper, lower) = (column(l), column(l + 1));
                let available = f64::from(self.soil[upper]) * SOIL_LAYER_DEPTHS[l] * drain;
                let space = (POROSITY - f64::from(self.soil[lower])).max(0.0)
                    * SOIL_LAYER_DEPTHS[l + 1];
                let moved = available.min(space);
                self.soil[upper] -= (moved / SOIL_LAYER_DEPTHS[l]) as f32;
                self.soil[lower] += (moved / SOIL_LAYER_DEPTHS[l + 1]) as f32;
            }

            let excess = liquid - infiltration;
            self.runoff[c] = excess / dt;
            lateral[self.terrain.cell_link[c]] += excess * cell_area / dt;
            for jr in j * rf..(j + 1) * rf {
                for ir in i * rf..(i + 1) * rf {
                    let r = ir + rnx * jr;
                    self.surface_depth[r] =
                        self.surface_depth[r] * PONDING_RECESSION + excess as f32;
                }
            }
        }

        self.route(&lateral);
        self.precipitation.iter_mut().for_each(|p| *p = 0.0);
        self.now = t;
        self.steps += 1;
        debug!(step = self.steps, time = t, "hydro step");
        Ok(())
    }

    /// Shift streamflow to the previous level and route the new one.
    fn route(&mut self, lateral: &[f64]) {
        let n = self.params.nlinks;
        let (previous, current) = self.streamflow.split_at_mut(n);
        previous.copy_from_slice(current);
        let mut inflow = vec![0.0; n];
        for k in (0..n).rev() {
            let q = lateral[k] + CHANNEL_STORAGE * f64::from(previous[k]) + inflow[k];
            current[k] = q as f32;
            if let Some(to) = self.terrain.downstream[k] {
                inflow[to] += q;
            }
        }
        for (gauge, &link) in self.gauge_flow.iter_mut().zip(&self.outlets) {
            *gauge = f64::from(current[link]);
        }
    }

    fn diverged(&self, reason: String) -> EngineError {
        EngineError::StepFailed {
            code: 1,
            reason: format!("step {}: {reason}", self.steps + 1),
        }
    }
}

fn build_grids(params: &HydroParams, terrain: &Terrain) -> Result<Vec<Grid>, CatalogError> {
    let (rnx, rny) = params.routing_extent();
    let rdx = params.routing_dx();
    let network = Mesh::new(terrain.link_x.clone(), terrain.link_y.clone())
        .with_edges(terrain.edge_nodes());
    let outlets = terrain.outlets();
    Ok(vec![
        Grid::uniform_rectilinear(
            GRID_LAND,
            &[params.ny, params.nx],
            &[params.dx, params.dx],
            &[params.dx / 2.0, params.dx / 2.0],
        )?,
        Grid::uniform_rectilinear(GRID_ROUTING, &[rny, rnx], &[rdx, rdx], &[rdx / 2.0, rdx / 2.0])?,
        Grid::unstructured(GRID_CHANNEL, network)?,
        Grid::points(
            GRID_GAUGES,
            outlets.iter().map(|&k| terrain.link_x[k]).collect(),
            outlets.iter().map(|&k| terrain.link_y[k]).collect(),
            None,
        )?,
        Grid::scalar(GRID_SCALAR),
    ])
}

fn build_layouts(params: &HydroParams) -> Result<Layouts, LayoutError> {
    let (nx, ny) = (params.nx, params.ny);
    let (rnx, rny) = params.routing_extent();
    Ok(Layouts {
        land: Layout::column_major(&[nx, ny]).reversed(),
        routing: Layout::column_major(&[rnx, rny]).reversed(),
        soil_top: Layout::column_major(&[nx, NSOIL, ny]).select(1, 0)?.reversed(),
        streamflow: Layout::column_major(&[params.nlinks, 2]).select(1, 1)?,
    })
}

fn unknown(name: &str) -> EngineError {
    EngineError::UnknownArray {
        name: name.to_string(),
    }
}

fn not_allocated(name: &str) -> EngineError {
    EngineError::Storage {
        name: name.to_string(),
        reason: "state not allocated".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmi_core::InitConfig;

    fn init(text: &str) -> HydroEngine {
        let config = InitConfig::from_descriptor(text).unwrap();
        let mut engine = HydroEngine::new();
        engine
            .initialize(&InitContext {
                config: &config,
                communicator: None,
            })
            .unwrap();
        engine
    }

    fn floats(array: &NativeArray<'_>) -> Vec<f64> {
        let offsets: Vec<usize> = array.layout().offsets().collect();
        match array.data() {
            NativeData::Float32(v) => offsets.iter().map(|&o| f64::from(v[o])).collect(),
            NativeData::Float64(v) => offsets.iter().map(|&o| v[o]).collect(),
            NativeData::Int32(v) => offsets.iter().map(|&o| f64::from(v[o])).collect(),
        }
    }

    #[test]
    fn uninitialized_engine_has_no_storage() {
        let engine = HydroEngine::new();
        match engine.read(STREAMFLOW) {
            Err(EngineError::Storage { .. }) => {}
            other => panic!("expected Storage, got {other:?}"),
        }
        assert_eq!(engine.runtime_requirement(), RuntimeRequirement::Serial);
        assert_eq!(HydroEngine::parallel().runtime_requirement(), RuntimeRequirement::Parallel);
    }

    #[test]
    fn domain_reports_five_grids_and_clock() {
        let config = InitConfig::from_descriptor("nx = 3\nny = 2\nrouting_factor = 2\n").unwrap();
        let mut engine = HydroEngine::new();
        let domain = engine
            .initialize(&InitContext {
                config: &config,
                communicator: None,
            })
            .unwrap();
        let sizes: Vec<usize> = domain.grids.iter().map(Grid::size).collect();
        let outlets = engine.terrain().unwrap().outlets().len();
        assert_eq!(sizes, vec![6, 24, 6, outlets, 1]);
        assert_eq!(domain.clock, ClockSpec::new(0.0, 86_400.0, 3600.0, "s"));
    }

    #[test]
    fn bad_config_is_init_failure() {
        let config = InitConfig::from_descriptor("nx = 0\nny = 2\n").unwrap();
        let mut engine = HydroEngine::new();
        match engine.initialize(&InitContext {
            config: &config,
            communicator: None,
        }) {
            Err(EngineError::InitFailed { code: 2, .. }) => {}
            other => panic!("expected InitFailed, got {other:?}"),
        }
    }

    #[test]
    fn streamflow_view_is_the_current_column() {
        let mut engine = init("nx = 2\nny = 1\nnlinks = 3\n");
        let s = engine.state.as_mut().unwrap();
        s.streamflow.copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let view = engine.read(STREAMFLOW).unwrap();
        assert_eq!(floats(&view), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn soil_view_is_the_top_layer() {
        let mut engine = init("nx = 2\nny = 2\n");
        let s = engine.state.as_mut().unwrap();
        for (k, v) in s.soil.iter_mut().enumerate() {
            *v = k as f32;
        }
        // (i, l, j) sits at i + 2 * (l + 4 * j).
        let view = engine.read(SOIL_MOISTURE).unwrap();
        assert_eq!(floats(&view), vec![0.0, 1.0, 8.0, 9.0]);
    }

    #[test]
    fn rain_on_warm_ground_runs_off_into_channels() {
        let mut engine = init("nx = 2\nny = 2\nnlinks = 1\ntime_step = 3600\n");
        if let (NativeDataMut::Float64(p), _) =
            engine.write_target(PRECIPITATION).unwrap().parts()
        {
            p.fill(0.01);
        }
        engine.step().unwrap();
        let s = engine.state.as_ref().unwrap();
        assert!(s.runoff.iter().all(|&r| r > 0.0));
        assert!(s.streamflow[1] > 0.0);
        assert_eq!(s.streamflow[0], 0.0);
        assert_eq!(s.gauge_flow, vec![f64::from(s.streamflow[1])]);
        assert!(s.precipitation.iter().all(|&p| p == 0.0));
        assert!(s.snow.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn rain_below_freezing_builds_snowpack() {
        let mut engine = init("nx = 1\nny = 1\nforcing_interval = 0\n");
        if let (NativeDataMut::Float64(t), _) =
            engine.write_target(AIR_TEMPERATURE).unwrap().parts()
        {
            t[0] = 260.0;
        }
        if let (NativeDataMut::Float64(p), _) =
            engine.write_target(PRECIPITATION).unwrap().parts()
        {
            p[0] = 0.001;
        }
        engine.step().unwrap();
        let s = engine.state.as_ref().unwrap();
        assert!((s.snow[0] - 0.0036).abs() < 1e-12);
        assert_eq!(s.runoff[0], 0.0);
    }

    #[test]
    fn temperature_write_slides_forcing() {
        let mut engine = init("nx = 1\nny = 1\n");
        if let (NativeDataMut::Float64(t), _) =
            engine.write_target(AIR_TEMPERATURE).unwrap().parts()
        {
            t[0] = 290.0;
        }
        let s = engine.state.as_ref().unwrap();
        assert_eq!(s.air_temperature.previous(), &[INITIAL_AIR_TEMPERATURE]);
        assert_eq!(s.air_temperature.current(), &[290.0]);
    }

    #[test]
    fn non_finite_rain_fails_the_step() {
        let mut engine = init("nx = 1\nny = 1\n");
        engine.state.as_mut().unwrap().precipitation[0] = f64::NAN;
        match engine.step() {
            Err(EngineError::StepFailed { code: 1, reason }) => assert!(reason.contains("cell 0")),
            other => panic!("expected StepFailed, got {other:?}"),
        }
    }

    #[test]
    fn outputs_are_not_writable() {
        let mut engine = init("nx = 1\nny = 1\n");
        match engine.write_target(STREAMFLOW) {
            Err(EngineError::UnknownArray { .. }) => {}
            other => panic!("expected UnknownArray, got {other:?}"),
        }
    }

    #[test]
    fn finalize_releases_state() {
        let mut engine = init("nx = 1\nny = 1\n");
        engine.finalize().unwrap();
        assert!(engine.params().is_none());
    }
}
