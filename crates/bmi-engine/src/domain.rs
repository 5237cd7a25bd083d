//! What an engine reports back from initialization.

use bmi_catalog::Grid;

/// Time axis of one session, in the engine's own units.
#[derive(Clone, Debug, PartialEq)]
pub struct ClockSpec {
    /// Model time at initialization.
    pub start_time: f64,
    /// Last reachable model time. `f64::INFINITY` for an unbounded run.
    pub end_time: f64,
    /// Length of one `update()`. Must be positive and finite.
    pub time_step: f64,
    /// Unit string, e.g. `"s"`.
    pub time_units: String,
}

impl ClockSpec {
    /// A clock from `start_time` to `end_time` stepping by `time_step`.
    pub fn new(start_time: f64, end_time: f64, time_step: f64, time_units: &str) -> Self {
        Self {
            start_time,
            end_time,
            time_step,
            time_units: time_units.to_string(),
        }
    }
}

/// Grids and clock established by [`Engine::initialize`](crate::Engine::initialize).
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    /// Every grid referenced by the engine's variables.
    pub grids: Vec<Grid>,
    /// The session time axis.
    pub clock: ClockSpec,
}
