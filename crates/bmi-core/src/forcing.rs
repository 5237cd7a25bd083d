//! Two-timepoint forcing buffers.
//!
//! Some inputs arrive at a coarse coupling interval but are consumed at
//! every internal step. [`ForcingPair`] keeps the previous and current
//! snapshots; each write slides `current` into `previous`, and the engine
//! reads a linear blend between them as its clock moves through the
//! forcing interval.
//!
//! This is engine-side storage. The adapter only sees the `current`
//! snapshot through the engine's write target.

/// Previous/current snapshot pair for one forced variable.
#[derive(Clone, Debug, PartialEq)]
pub struct ForcingPair {
    previous: Vec<f64>,
    current: Vec<f64>,
    valid_from: f64,
    interval: f64,
}

impl ForcingPair {
    /// Both snapshots filled with `initial`; blending spans `interval`
    /// time units after each write. `interval <= 0` disables blending.
    pub fn new(len: usize, initial: f64, start: f64, interval: f64) -> Self {
        Self {
            previous: vec![initial; len],
            current: vec![initial; len],
            valid_from: start,
            interval,
        }
    }

    /// Number of elements per snapshot.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Whether the snapshots are empty.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Slide `current → previous` and return `current` for overwriting.
    ///
    /// `now` is the model time at which the new values are installed; the
    /// blend reaches them at `now + interval`.
    pub fn slide_for_write(&mut self, now: f64) -> &mut [f64] {
        self.previous.copy_from_slice(&self.current);
        self.valid_from = now;
        &mut self.current
    }

    /// The most recently installed snapshot.
    pub fn current(&self) -> &[f64] {
        &self.current
    }

    /// The snapshot before the last write.
    pub fn previous(&self) -> &[f64] {
        &self.previous
    }

    /// Blend weight of `current` at time `t`, in `[0, 1]`.
    pub fn weight(&self, t: f64) -> f64 {
        if self.interval <= 0.0 {
            return 1.0;
        }
        ((t - self.valid_from) / self.interval).clamp(0.0, 1.0)
    }

    /// Write the blended snapshot at time `t` into `out`.
    ///
    /// `out` must have [`len`](Self::len) elements.
    pub fn interpolate(&self, t: f64, out: &mut [f64]) {
        let w = self.weight(t);
        for ((o, &p), &c) in out.iter_mut().zip(&self.previous).zip(&self.current) {
            *o = p + w * (c - p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_slides_current_into_previous() {
        let mut pair = ForcingPair::new(2, 280.0, 0.0, 3600.0);
        pair.slide_for_write(0.0).copy_from_slice(&[290.0, 300.0]);
        assert_eq!(pair.previous(), &[280.0, 280.0]);
        assert_eq!(pair.current(), &[290.0, 300.0]);

        pair.slide_for_write(3600.0).copy_from_slice(&[270.0, 270.0]);
        assert_eq!(pair.previous(), &[290.0, 300.0]);
        assert_eq!(pair.current(), &[270.0, 270.0]);
    }

    #[test]
    fn interpolation_blends_across_interval() {
        let mut pair = ForcingPair::new(1, 0.0, 0.0, 100.0);
        pair.slide_for_write(0.0)[0] = 10.0;
        let mut out = [0.0];
        pair.interpolate(0.0, &mut out);
        assert_eq!(out, [0.0]);
        pair.interpolate(50.0, &mut out);
        assert!((out[0] - 5.0).abs() < 1e-12);
        pair.interpolate(250.0, &mut out);
        assert_eq!(out, [10.0]);
    }

    #[test]
    fn zero_interval_uses_current() {
        let mut pair = ForcingPair::new(1, 1.0, 0.0, 0.0);
        pair.slide_for_write(5.0)[0] = 2.0;
        assert_eq!(pair.weight(5.0), 1.0);
    }
}
