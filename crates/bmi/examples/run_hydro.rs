//! Drive the reference hydrology engine through a storm and print the
//! gauge hydrograph.
//!
//! ```text
//! cargo run -p bmi --example run_hydro
//! RUST_LOG=debug cargo run -p bmi --example run_hydro
//! ```

use bmi::hydro::names::{AIR_TEMPERATURE, GAUGE_FLOW, PRECIPITATION};
use bmi::prelude::*;
use tracing::info;

const NX: usize = 24;
const NY: usize = 16;
const NAMELIST: &str = "&hydro_nlist
  nx = 24
  ny = 16
  dx = 500.0
  routing_factor = 4
  start_time = 0.0
  end_time = 172800.0
  time_step = 3600.0
  seed = 2024
/
";

fn main() -> Result<(), AdapterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut model = Adapter::new(HydroEngine::new())?;
    model.register()?;
    model.initialize(NAMELIST)?;
    info!(
        component = model.component_name(),
        end = model.end_time()?,
        units = model.time_units()?,
        "session ready"
    );

    let warm = vec![285.0; NX * NY];
    let storm = vec![0.02; NX * NY];
    let mut hour = 0;
    while model.current_time()? < model.end_time()? {
        model.set_value(AIR_TEMPERATURE, warm.as_slice().into())?;
        if hour < 6 {
            model.set_value(PRECIPITATION, storm.as_slice().into())?;
        }
        model.update()?;
        hour += 1;

        let gauges: Vec<f64> = model.get_value_vec(GAUGE_FLOW)?;
        let total: f64 = gauges.iter().sum();
        println!(
            "t = {:>8.0} s  gauges = {:>3}  outflow = {total:>12.3} m3 s-1",
            model.current_time()?,
            gauges.len()
        );
    }

    model.finalize()?;
    Ok(())
}
