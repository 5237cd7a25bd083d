//! Model parameters read from the initialization descriptor.

use bmi_core::{ConfigError, InitConfig};

/// Soil column depth of each layer, top first, in metres.
pub const SOIL_LAYER_DEPTHS: [f64; 4] = [0.1, 0.3, 0.6, 1.0];

/// Largest element count of any exposed array. Sizes, shapes and indices
/// cross the C boundary as `int`.
pub const MAX_ELEMENTS: usize = i32::MAX as usize;

/// Resolved hydrology parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct HydroParams {
    /// Land cells along x.
    pub nx: usize,
    /// Land cells along y.
    pub ny: usize,
    /// Land cell size in metres.
    pub dx: f64,
    /// Routing cells per land cell along each axis.
    pub routing_factor: usize,
    /// Channel links.
    pub nlinks: usize,
    /// Model start time.
    pub start_time: f64,
    /// Model end time.
    pub end_time: f64,
    /// Model step.
    pub time_step: f64,
    /// Unit of the three times above.
    pub time_units: String,
    /// Time over which a new air temperature is blended in.
    pub forcing_interval: f64,
    /// Terrain and channel generator seed.
    pub seed: u64,
}

impl HydroParams {
    /// Read and range-check every key, applying defaults.
    pub fn from_config(config: &InitConfig) -> Result<Self, ConfigError> {
        let nx = positive_count(config, "nx", None)?;
        let ny = positive_count(config, "ny", None)?;
        let dx = config.get_f64("dx")?.unwrap_or(1000.0);
        if !(dx.is_finite() && dx > 0.0) {
            return Err(invalid("dx", format!("must be positive, got {dx}")));
        }
        let routing_factor = positive_count(config, "routing_factor", Some(4))?;
        let layers = SOIL_LAYER_DEPTHS.len();
        let cells = element_count("nx", &[nx, ny, layers])? / layers;
        element_count("routing_factor", &[cells, routing_factor, routing_factor])?;
        let nlinks = positive_count(config, "nlinks", Some(cells))?;
        element_count("nlinks", &[nlinks, 2])?;
        let start_time = config.get_f64("start_time")?.unwrap_or(0.0);
        let end_time = config.get_f64("end_time")?.unwrap_or(86_400.0);
        let time_step = config.get_f64("time_step")?.unwrap_or(3600.0);
        let time_units = config.get_str("time_units")?.unwrap_or("s").to_string();
        let forcing_interval = config.get_f64("forcing_interval")?.unwrap_or(time_step);
        if forcing_interval.is_nan() || forcing_interval < 0.0 {
            return Err(invalid(
                "forcing_interval",
                format!("must not be negative, got {forcing_interval}"),
            ));
        }
        let seed = match config.get_i64("seed")? {
            None => 0,
            Some(s) => u64::try_from(s)
                .map_err(|_| invalid("seed", format!("must not be negative, got {s}")))?,
        };
        Ok(Self {
            nx,
            ny,
            dx,
            routing_factor,
            nlinks,
            start_time,
            end_time,
            time_step,
            time_units,
            forcing_interval,
            seed,
        })
    }

    /// Land cell count. Bounded by [`MAX_ELEMENTS`] once parsed.
    pub fn land_cells(&self) -> usize {
        self.nx * self.ny
    }

    /// Routing grid extents, `(nx, ny)`.
    pub fn routing_extent(&self) -> (usize, usize) {
        (self.nx * self.routing_factor, self.ny * self.routing_factor)
    }

    /// Routing cell size in metres.
    pub fn routing_dx(&self) -> f64 {
        self.dx / self.routing_factor as f64
    }
}

fn positive_count(
    config: &InitConfig,
    key: &str,
    default: Option<usize>,
) -> Result<usize, ConfigError> {
    let value = match (config.get_i64(key)?, default) {
        (Some(v), _) => v,
        (None, Some(d)) => return Ok(d),
        (None, None) => config.require_i64(key)?,
    };
    match usize::try_from(value) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, format!("must be at least 1, got {value}"))),
    }
}

/// Product of `factors`, rejected under `key` past [`MAX_ELEMENTS`].
fn element_count(key: &str, factors: &[usize]) -> Result<usize, ConfigError> {
    factors
        .iter()
        .try_fold(1usize, |n, &f| n.checked_mul(f))
        .filter(|&n| n <= MAX_ELEMENTS)
        .ok_or_else(|| {
            invalid(
                key,
                format!("grid of {factors:?} exceeds {MAX_ELEMENTS} elements"),
            )
        })
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}
