//! The session clock.
//!
//! Current time is derived from the step count, `start + steps * dt`, so
//! long runs carry no accumulated floating-point drift.

use bmi_engine::ClockSpec;

use crate::error::AdapterError;

/// Relative slack when comparing a time against a step boundary.
const STEP_EPSILON: f64 = 1e-9;

/// Start, end, step and position of one session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionClock {
    start: f64,
    end: f64,
    dt: f64,
    units: String,
    steps: u64,
}

impl SessionClock {
    /// Validate an engine-reported clock.
    ///
    /// `end` may be `+inf` for an unbounded run; everything else must be
    /// finite, `dt > 0` and `end >= start`.
    pub fn new(spec: &ClockSpec) -> Result<Self, AdapterError> {
        let invalid = |reason: &str| AdapterError::InvalidDomain {
            reason: reason.to_string(),
        };
        if !spec.start_time.is_finite() {
            return Err(invalid("start time is not finite"));
        }
        if !(spec.time_step.is_finite() && spec.time_step > 0.0) {
            return Err(invalid("time step must be positive and finite"));
        }
        if spec.end_time.is_nan() || spec.end_time < spec.start_time {
            return Err(invalid("end time precedes start time"));
        }
        Ok(Self {
            start: spec.start_time,
            end: spec.end_time,
            dt: spec.time_step,
            units: spec.time_units.clone(),
            steps: 0,
        })
    }

    /// Start time.
    pub fn start_time(&self) -> f64 {
        self.start
    }

    /// End time; `+inf` if unbounded.
    pub fn end_time(&self) -> f64 {
        self.end
    }

    /// Current model time.
    pub fn current_time(&self) -> f64 {
        self.time_after(self.steps)
    }

    /// Step length.
    pub fn time_step(&self) -> f64 {
        self.dt
    }

    /// Unit string.
    pub fn time_units(&self) -> &str {
        &self.units
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn time_after(&self, steps: u64) -> f64 {
        self.start + steps as f64 * self.dt
    }

    fn within_end(&self, t: f64) -> bool {
        t <= self.end + STEP_EPSILON * self.dt
    }

    /// Reject a step that would carry the clock past a bounded end.
    pub fn check_step(&self) -> Result<(), AdapterError> {
        let next = self.time_after(self.steps + 1);
        if self.within_end(next) {
            Ok(())
        } else {
            Err(AdapterError::InvalidTime {
                requested: next,
                reason: "next step passes the end time",
            })
        }
    }

    /// Record one completed step.
    pub fn advance(&mut self) {
        self.steps += 1;
    }

    /// Steps needed to reach the first step boundary at or after `t`.
    ///
    /// `t` equal to the current time needs zero steps. Everything is
    /// validated up front so a rejected target runs no steps at all.
    pub fn steps_until(&self, t: f64) -> Result<u64, AdapterError> {
        let reject = |reason| AdapterError::InvalidTime {
            requested: t,
            reason,
        };
        if !t.is_finite() {
            return Err(reject("target time is not finite"));
        }
        let now = self.current_time();
        if t < now - STEP_EPSILON * self.dt {
            return Err(reject("target time is before the current time"));
        }
        if !self.within_end(t) {
            return Err(reject("target time is past the end time"));
        }
        let target = ((t - self.start) / self.dt - STEP_EPSILON).ceil().max(0.0) as u64;
        let needed = target.saturating_sub(self.steps);
        if !self.within_end(self.time_after(self.steps + needed)) {
            return Err(reject("rounding up to a step boundary passes the end time"));
        }
        Ok(needed)
    }
}
