//! Fixed-window rolling statistics for level metering.
//!
//! The input path pushes one datum per frame (the normalized peak of that
//! frame); the meter exposes the windowed average and maximum. A 300 ms
//! window at 20 ms frames is 15 entries.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Rolling average and maximum over the last `N` data points.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    window: Vec<f64>,
    next: usize,
    filled: usize,
}

impl RollingAverage {
    /// Create a meter with the given window length (at least 1).
    #[must_use]
    pub fn new(window_len: usize) -> Self {
        let window_len = window_len.max(1);
        Self {
            window: vec![0.0; window_len],
            next: 0,
            filled: 0,
        }
    }

    /// Push one datum, evicting the oldest once the window is full.
    pub fn add(&mut self, datum: f64) {
        self.window[self.next] = datum;
        self.next = (self.next + 1) % self.window.len();
        if self.filled < self.window.len() {
            self.filled += 1;
        }
    }

    /// Average over the filled portion of the window, 0.0 when empty.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        let sum: f64 = self.window[..self.filled].iter().sum();
        sum / self.filled as f64
    }

    /// Maximum over the filled portion of the window, 0.0 when empty.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.window[..self.filled]
            .iter()
            .copied()
            .fold(0.0f64, f64::max)
    }

    /// Forget all data.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.next = 0;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reads_zero() {
        let meter = RollingAverage::new(15);
        assert_eq!(meter.average(), 0.0);
        assert_eq!(meter.max(), 0.0);
    }

    #[test]
    fn test_partial_window() {
        let mut meter = RollingAverage::new(4);
        meter.add(1.0);
        meter.add(0.5);
        assert!((meter.average() - 0.75).abs() < 1e-12);
        assert_eq!(meter.max(), 1.0);
    }

    #[test]
    fn test_eviction() {
        let mut meter = RollingAverage::new(2);
        meter.add(1.0);
        meter.add(0.0);
        meter.add(0.0);
        // The 1.0 has rolled out of the window.
        assert_eq!(meter.average(), 0.0);
        assert_eq!(meter.max(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut meter = RollingAverage::new(3);
        meter.add(0.9);
        meter.reset();
        assert_eq!(meter.average(), 0.0);
        assert_eq!(meter.max(), 0.0);
    }
}
