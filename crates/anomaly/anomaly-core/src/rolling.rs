//! Incremental mean and population variance over a fixed-size window.

use anomaly_spi::{AnomalyError, Result};

/// Mean and population variance of a fixed-size window, maintained in O(1)
/// per replaced value.
///
/// The statistics are meaningless until [`seed`](Self::seed) has been called
/// with a full window. After that, every [`update`](Self::update) replaces
/// exactly one value. Incremental updates drift slowly in floating point;
/// re-seeding from a snapshot of the window brings them back in line.
#[derive(Debug, Clone)]
pub struct RollingStatistics {
    window_size: usize,
    mean: f64,
    variance: f64,
    initialized: bool,
}

impl RollingStatistics {
    /// Create uninitialized statistics for a window of `window_size` values.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            mean: 0.0,
            variance: 0.0,
            initialized: false,
        }
    }

    /// Compute mean and population variance directly from a full window.
    pub fn seed(&mut self, window: &[f64]) -> Result<()> {
        if window.len() != self.window_size {
            return Err(AnomalyError::InsufficientData {
                required: self.window_size,
                got: window.len(),
            });
        }

        let Some(&first) = window.first() else {
            return Err(AnomalyError::InsufficientData { required: 1, got: 0 });
        };
        if window.iter().all(|&x| x == first) {
            // A rounded sum / n can land an ulp off a flat window's value,
            // which would give every later point a z-score of +-1.
            self.mean = first;
            self.variance = 0.0;
            self.initialized = true;
            return Ok(());
        }

        let n = self.window_size as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        self.mean = mean;
        self.variance = clamp_variance(variance);
        self.initialized = true;
        Ok(())
    }

    /// Replace `outgoing` with `incoming` and return the new `(mean, std_dev)`.
    ///
    /// Both values must belong to the same tick: `incoming` takes the slot
    /// `outgoing` vacated.
    pub fn update(&mut self, incoming: f64, outgoing: f64) -> (f64, f64) {
        let n = self.window_size as f64;
        let delta = (incoming - outgoing) / n;
        let new_mean = self.mean + delta;

        let leaving = outgoing - self.mean;
        let entering = incoming - new_mean;
        // Sum of squared deviations: drop the leaving term, add the entering
        // term, then correct the remaining n - 1 terms for the shifted mean.
        let m2 = self.variance * n - leaving * leaving
            + entering * entering
            + delta * (entering + leaving);

        self.mean = new_mean;
        self.variance = clamp_variance(m2 / n);
        (self.mean, self.std_dev())
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, never negative. NaN if a NaN entered the window.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Whether [`seed`](Self::seed) has run since construction or the last reset.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// False once a NaN or infinity has reached the mean or variance.
    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.variance.is_finite()
    }

    /// Forget the seeded values.
    pub fn reset(&mut self) {
        self.mean = 0.0;
        self.variance = 0.0;
        self.initialized = false;
    }
}

/// Negative variance can only come from rounding. NaN passes through.
fn clamp_variance(variance: f64) -> f64 {
    if variance < 0.0 {
        0.0
    } else {
        variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::VecDeque;

    fn direct(window: &VecDeque<f64>) -> (f64, f64) {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, variance)
    }

    fn close(actual: f64, expected: f64, rel: f64) -> bool {
        (actual - expected).abs() <= rel * expected.abs().max(1.0)
    }

    #[test]
    fn test_new_is_uninitialized() {
        let stats = RollingStatistics::new(4);
        assert!(!stats.is_initialized());
        assert_eq!(stats.window_size(), 4);
    }

    #[test]
    fn test_seed_population_variance() {
        let mut stats = RollingStatistics::new(4);
        stats.seed(&[2.0, 4.0, 4.0, 6.0]).unwrap();
        assert!(stats.is_initialized());
        assert!((stats.mean() - 4.0).abs() < 1e-12);
        // Divisor n, not n - 1.
        assert!((stats.variance() - 2.0).abs() < 1e-12);
        assert!((stats.std_dev() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_seed_rejects_wrong_length() {
        let mut stats = RollingStatistics::new(5);
        let err = stats.seed(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            AnomalyError::InsufficientData { required: 5, got: 3 }
        ));
        assert!(!stats.is_initialized());
    }

    #[test]
    fn test_update_single_replacement() {
        let mut stats = RollingStatistics::new(5);
        stats.seed(&[1.0; 5]).unwrap();

        let (mean, std_dev) = stats.update(50.0, 1.0);
        // Window is now [1, 1, 1, 1, 50].
        assert!((mean - 10.8).abs() < 1e-12);
        assert!((stats.variance() - 384.16).abs() < 1e-9);
        assert!((std_dev - 19.6).abs() < 1e-9);
    }

    #[test]
    fn test_seed_flat_window_is_exact() {
        for (window_size, value) in [(10, 4.2), (30, 0.1), (3, 0.1), (7, 1.1), (4, -3.3)] {
            let mut stats = RollingStatistics::new(window_size);
            stats.seed(&vec![value; window_size]).unwrap();
            assert_eq!(stats.mean(), value, "window {window_size} of {value}");
            assert_eq!(stats.variance(), 0.0);

            let (mean, std_dev) = stats.update(value, value);
            assert_eq!(mean, value);
            assert_eq!(std_dev, 0.0);
        }
    }

    #[test]
    fn test_seed_nan_window_is_not_flat() {
        let mut stats = RollingStatistics::new(2);
        stats.seed(&[f64::NAN, f64::NAN]).unwrap();
        assert!(stats.mean().is_nan());
        assert!(!stats.is_finite());
    }

    #[test]
    fn test_update_constant_window_stays_flat() {
        let mut stats = RollingStatistics::new(3);
        stats.seed(&[7.0, 7.0, 7.0]).unwrap();
        for _ in 0..100 {
            let (mean, std_dev) = stats.update(7.0, 7.0);
            assert_eq!(mean, 7.0);
            assert_eq!(std_dev, 0.0);
        }
    }

    #[test]
    fn test_update_matches_direct_recomputation() {
        let window_size = 30;
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut window: VecDeque<f64> =
            (0..window_size).map(|_| rng.gen_range(-100.0..100.0)).collect();

        let mut stats = RollingStatistics::new(window_size);
        stats.seed(window.make_contiguous()).unwrap();

        for tick in 0..10_000 {
            let incoming = rng.gen_range(-100.0..100.0);
            let outgoing = window.pop_front().unwrap();
            window.push_back(incoming);
            stats.update(incoming, outgoing);

            let (mean, variance) = direct(&window);
            assert!(
                close(stats.mean(), mean, 1e-9),
                "mean drifted at tick {tick}: {} vs {mean}",
                stats.mean()
            );
            assert!(
                close(stats.variance(), variance, 1e-9),
                "variance drifted at tick {tick}: {} vs {variance}",
                stats.variance()
            );
        }
    }

    #[test]
    fn test_variance_never_negative() {
        let window_size = 8;
        let mut rng = StdRng::seed_from_u64(42);
        // Nearly constant values with huge offsets provoke cancellation.
        let mut window: VecDeque<f64> = (0..window_size)
            .map(|_| 1e8 + rng.gen_range(0.0..1e-6))
            .collect();

        let mut stats = RollingStatistics::new(window_size);
        stats.seed(window.make_contiguous()).unwrap();

        for _ in 0..10_000 {
            let incoming = 1e8 + rng.gen_range(0.0..1e-6);
            let outgoing = window.pop_front().unwrap();
            window.push_back(incoming);
            let (_, std_dev) = stats.update(incoming, outgoing);
            assert!(stats.variance() >= 0.0);
            assert!(!std_dev.is_nan());
        }
    }

    #[test]
    fn test_nan_passes_through_clamp() {
        let mut stats = RollingStatistics::new(2);
        stats.seed(&[1.0, 2.0]).unwrap();
        let (mean, std_dev) = stats.update(f64::NAN, 1.0);
        assert!(mean.is_nan());
        assert!(std_dev.is_nan());
    }

    #[test]
    fn test_reset_clears_initialization() {
        let mut stats = RollingStatistics::new(2);
        stats.seed(&[1.0, 3.0]).unwrap();
        stats.reset();
        assert!(!stats.is_initialized());
        assert_eq!(stats.mean(), 0.0);
    }
}
