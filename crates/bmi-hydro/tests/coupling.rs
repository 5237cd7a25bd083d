//! The hydrology engine driven through the adapter, as a coupler would.

use bmi_adapter::{Adapter, AdapterError};
use bmi_catalog::GridKind;
use bmi_core::{ValueSlice, ValueSliceMut, VarRole};
use bmi_hydro::names::*;
use bmi_hydro::{HydroEngine, HydroParams, Terrain};
use bmi_test_utils::{config, hydro_namelist, private_slot, TempConfig};

const NX: usize = 4;
const NY: usize = 3;
const CELLS: usize = NX * NY;

fn session() -> Adapter {
    let mut a = Adapter::builder(Box::new(HydroEngine::new()))
        .slot(private_slot())
        .build()
        .unwrap();
    a.register().unwrap();
    a.initialize(&hydro_namelist(NX, NY)).unwrap();
    a
}

fn terrain() -> Terrain {
    Terrain::generate(&HydroParams::from_config(&config(&hydro_namelist(NX, NY))).unwrap())
}

fn rain(a: &mut Adapter, rate: f64) {
    a.set_value(PRECIPITATION, ValueSlice::Float64(&[rate; CELLS]))
        .unwrap();
}

#[test]
fn catalog_and_grids_describe_the_domain() {
    let a = session();
    assert_eq!(a.component_name(), "Hydro Reference Model v1.0");
    assert_eq!(a.runtime_name(), "serial");
    let catalog = a.catalog();
    assert_eq!(
        catalog.variable_names(VarRole::Input),
        vec![PRECIPITATION, AIR_TEMPERATURE, COMM]
    );
    assert_eq!(catalog.variable_count(VarRole::Output), 7);

    assert_eq!(catalog.grid_type(GRID_LAND).unwrap(), GridKind::UniformRectilinear);
    assert_eq!(catalog.grid(GRID_LAND).unwrap().shape().unwrap(), &[NY, NX]);
    assert_eq!(catalog.grid(GRID_ROUTING).unwrap().shape().unwrap(), &[2 * NY, 2 * NX]);
    assert_eq!(catalog.grid(GRID_ROUTING).unwrap().spacing().unwrap(), &[500.0, 500.0]);
    assert_eq!(catalog.grid_type(GRID_CHANNEL).unwrap(), GridKind::UnstructuredMesh);
    assert_eq!(catalog.grid_type(GRID_SCALAR).unwrap(), GridKind::Scalar);

    let t = terrain();
    let outlets = t.outlets();
    let channel = catalog.grid(GRID_CHANNEL).unwrap();
    assert_eq!(channel.node_count().unwrap(), CELLS);
    assert_eq!(channel.edge_count().unwrap(), CELLS - outlets.len());
    assert_eq!(channel.face_count().unwrap(), 0);
    assert_eq!(catalog.grid_size(GRID_GAUGES).unwrap(), outlets.len());
    assert_eq!(catalog.var_size(STREAMFLOW).unwrap(), CELLS);
    assert_eq!(catalog.var_nbytes(SURFACE_WATER_DEPTH).unwrap(), 4 * CELLS * 8);
}

#[test]
fn initial_state_reads_through_native_layouts() {
    let a = session();
    assert_eq!(a.get_value_vec::<f64>(SOIL_MOISTURE).unwrap(), vec![0.25; CELLS]);
    assert_eq!(a.get_value_vec::<f64>(AIR_TEMPERATURE).unwrap(), vec![280.0; CELLS]);
    assert_eq!(
        a.get_value_vec::<i32>(LINK_ID).unwrap(),
        (1..=CELLS as i32).collect::<Vec<_>>()
    );
    assert_eq!(a.get_value_vec::<f64>(STREAMFLOW).unwrap(), vec![0.0; CELLS]);
}

#[test]
fn precipitation_accumulates_until_the_step_consumes_it() {
    let mut a = session();
    rain(&mut a, 0.25);
    rain(&mut a, 0.25);
    assert_eq!(a.get_value_vec::<f64>(PRECIPITATION).unwrap(), vec![0.5; CELLS]);
    a.update().unwrap();
    assert_eq!(a.get_value_vec::<f64>(PRECIPITATION).unwrap(), vec![0.0; CELLS]);
}

#[test]
fn rain_reaches_the_gauges() {
    let mut a = session();
    rain(&mut a, 0.01);
    a.update().unwrap();

    let runoff = a.get_value_vec::<f64>(RUNOFF).unwrap();
    assert!(runoff.iter().all(|&r| r > 0.0));
    let depth = a.get_value_vec::<f64>(SURFACE_WATER_DEPTH).unwrap();
    assert!(depth.iter().all(|&d| d > 0.0));

    let flow = a.get_value_vec::<f64>(STREAMFLOW).unwrap();
    let gauges = a.get_value_vec::<f64>(GAUGE_FLOW).unwrap();
    let expected: Vec<f64> = terrain().outlets().iter().map(|&k| flow[k]).collect();
    assert_eq!(gauges, expected);

    // All runoff leaves through the outlets on the first step.
    let inflow: f64 = runoff.iter().sum::<f64>() * 1000.0 * 1000.0;
    let outflow: f64 = gauges.iter().sum();
    assert!((inflow - outflow).abs() / inflow < 1e-5);
}

#[test]
fn cold_air_turns_rain_into_snow() {
    let mut a = session();
    a.set_value(AIR_TEMPERATURE, ValueSlice::Float64(&[260.0; CELLS]))
        .unwrap();
    rain(&mut a, 0.01);
    a.update().unwrap();
    let snow = a.get_value_vec::<f64>(SNOW_DEPTH).unwrap();
    assert!(snow.iter().all(|&s| (s - 0.036).abs() < 1e-12));
    assert_eq!(a.get_value_vec::<f64>(RUNOFF).unwrap(), vec![0.0; CELLS]);
}

#[test]
fn temperature_at_indices_lands_in_canonical_cells() {
    let mut a = session();
    a.set_value_at_indices(
        AIR_TEMPERATURE,
        &[0, 5, 11],
        ValueSlice::Float64(&[290.0, 291.0, 292.0]),
    )
    .unwrap();
    let mut out = [0.0; 3];
    a.get_value_at_indices(AIR_TEMPERATURE, ValueSliceMut::Float64(&mut out), &[11, 5, 1])
        .unwrap();
    assert_eq!(out, [292.0, 291.0, 280.0]);
}

#[test]
fn outputs_reject_writes() {
    let mut a = session();
    match a.set_value(STREAMFLOW, ValueSlice::Float64(&[1.0; CELLS])) {
        Err(AdapterError::ReadOnly { name }) => assert_eq!(name, STREAMFLOW),
        other => panic!("expected ReadOnly, got {other:?}"),
    }
}

#[test]
fn full_day_ends_at_the_configured_end() {
    let mut a = session();
    a.update_until(86_400.0).unwrap();
    assert_eq!(a.current_time().unwrap(), 86_400.0);
    match a.update() {
        Err(AdapterError::InvalidTime { .. }) => {}
        other => panic!("expected InvalidTime, got {other:?}"),
    }
    a.finalize().unwrap();
}

#[test]
fn same_seed_same_streamflow() {
    let run = || {
        let mut a = session();
        for _ in 0..3 {
            rain(&mut a, 0.02);
            a.update().unwrap();
        }
        let flow = a.get_value_vec::<f64>(STREAMFLOW).unwrap();
        a.finalize().unwrap();
        flow
    };
    assert_eq!(run(), run());
}

#[test]
fn descriptor_file_path_initializes() {
    let file = TempConfig::new(&hydro_namelist(2, 2));
    let mut a = Adapter::builder(Box::new(HydroEngine::new()))
        .slot(private_slot())
        .build()
        .unwrap();
    a.register().unwrap();
    a.initialize(&file.descriptor()).unwrap();
    assert_eq!(a.catalog().grid_size(GRID_LAND).unwrap(), 4);
}

#[test]
fn missing_grid_extent_fails_initialization() {
    let mut a = Adapter::builder(Box::new(HydroEngine::new()))
        .slot(private_slot())
        .build()
        .unwrap();
    a.register().unwrap();
    match a.initialize("&hydro_nlist\n nx = 4\n/\n") {
        Err(AdapterError::Engine(e)) => assert!(e.to_string().contains("ny")),
        other => panic!("expected engine init failure, got {other:?}"),
    }
}
