//! Rolling-window z-score detector.

use std::collections::VecDeque;

use anomaly_api::DetectorConfig;
use anomaly_spi::{AnomalyRecord, DetectorPhase, Result, StreamingDetector};
use tracing::{debug, trace, warn};

use crate::rolling::RollingStatistics;

// ============================================================================
// Anomaly Detector
// ============================================================================

/// Online z-score detector over the most recent `window_size` values.
///
/// The first `window_size` values only fill the window. The value that
/// completes it seeds the statistics and is itself not scored. Every later
/// value replaces the oldest one, updates the statistics incrementally and is
/// scored against the window it has just joined.
///
/// # Example
///
/// ```
/// use anomaly_core::AnomalyDetector;
///
/// let mut detector = AnomalyDetector::new(5, 1.5).unwrap();
/// let records: Vec<_> = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0]
///     .into_iter()
///     .filter_map(|v| detector.process(v))
///     .collect();
///
/// assert_eq!(records.len(), 2);
/// assert!(records[1].is_anomaly);
/// ```
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: DetectorConfig,
    window: VecDeque<f64>,
    stats: RollingStatistics,
    /// NaN or infinite values currently in the window.
    non_finite: usize,
    ticks_seen: u64,
    streaming_ticks: u64,
}

impl AnomalyDetector {
    /// Create a detector with the given window size and threshold.
    ///
    /// Fails when `window_size < 2` or `threshold` is not a positive finite
    /// number.
    pub fn new(window_size: usize, threshold: f64) -> Result<Self> {
        Self::from_config(DetectorConfig::new(window_size, threshold))
    }

    /// Create from configuration.
    pub fn from_config(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: VecDeque::with_capacity(config.window_size),
            stats: RollingStatistics::new(config.window_size),
            config,
            non_finite: 0,
            ticks_seen: 0,
            streaming_ticks: 0,
        })
    }

    /// Feed the next value. See [`StreamingDetector::process`].
    pub fn process(&mut self, value: f64) -> Option<AnomalyRecord> {
        self.ticks_seen += 1;
        if !value.is_finite() {
            self.non_finite += 1;
        }

        if !self.stats.is_initialized() {
            self.window.push_back(value);
            if self.window.len() == self.config.window_size {
                self.seed_from_window();
                debug!(
                    tick = self.ticks_seen,
                    mean = self.stats.mean(),
                    std_dev = self.stats.std_dev(),
                    "window full, statistics seeded"
                );
            }
            return None;
        }

        let Some(outgoing) = self.window.pop_front() else {
            return None;
        };
        if !outgoing.is_finite() {
            self.non_finite -= 1;
        }
        self.window.push_back(value);
        self.streaming_ticks += 1;

        // Incremental updates never shed a NaN or infinity once absorbed, so
        // poisoned statistics are rebuilt as soon as the window is clean.
        let recovered = self.non_finite == 0 && !self.stats.is_finite();
        let (mean, std_dev) = if self.resync_due() || recovered {
            self.seed_from_window();
            trace!(tick = self.ticks_seen, recovered, "statistics resynchronized");
            (self.stats.mean(), self.stats.std_dev())
        } else {
            self.stats.update(value, outgoing)
        };

        let zscore = if std_dev != 0.0 {
            (value - mean) / std_dev
        } else {
            0.0
        };
        let is_anomaly = zscore.abs() > self.config.threshold;

        trace!(tick = self.ticks_seen, value, zscore, is_anomaly, "classified");

        Some(AnomalyRecord {
            tick: self.ticks_seen,
            value,
            zscore,
            is_anomaly,
            mean,
            std_dev,
        })
    }

    /// Recompute mean and variance directly from the current window,
    /// discarding accumulated drift. No-op while the window is filling.
    pub fn resync(&mut self) {
        if self.stats.is_initialized() {
            self.seed_from_window();
            debug!(tick = self.ticks_seen, "statistics resynchronized on request");
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DetectorPhase {
        if self.stats.is_initialized() {
            DetectorPhase::Streaming
        } else {
            DetectorPhase::Filling
        }
    }

    /// Values currently in the window, oldest first.
    pub fn window(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    /// Number of values currently in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn ticks_seen(&self) -> u64 {
        self.ticks_seen
    }

    /// Rolling statistics over the current window.
    pub fn statistics(&self) -> &RollingStatistics {
        &self.stats
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn window_size(&self) -> usize {
        self.config.window_size
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Return to the initial, empty state. Configuration is kept.
    pub fn reset(&mut self) {
        self.window.clear();
        self.stats.reset();
        self.non_finite = 0;
        self.ticks_seen = 0;
        self.streaming_ticks = 0;
    }

    fn resync_due(&self) -> bool {
        match self.config.resync_interval {
            Some(interval) => self.streaming_ticks % interval as u64 == 0,
            None => false,
        }
    }

    fn seed_from_window(&mut self) {
        if let Err(err) = self.stats.seed(self.window.make_contiguous()) {
            warn!(%err, "window not full, statistics left unchanged");
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::from_config(DetectorConfig::default()).unwrap()
    }
}

impl StreamingDetector for AnomalyDetector {
    fn process(&mut self, value: f64) -> Option<AnomalyRecord> {
        AnomalyDetector::process(self, value)
    }

    fn phase(&self) -> DetectorPhase {
        AnomalyDetector::phase(self)
    }

    fn ticks_seen(&self) -> u64 {
        self.ticks_seen
    }

    fn reset(&mut self) {
        AnomalyDetector::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomaly_spi::AnomalyError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn feed(detector: &mut AnomalyDetector, values: &[f64]) -> Vec<Option<AnomalyRecord>> {
        values.iter().map(|&v| detector.process(v)).collect()
    }

    #[test]
    fn test_rejects_small_window() {
        for window_size in [0, 1] {
            let err = AnomalyDetector::new(window_size, 3.0).unwrap_err();
            assert!(matches!(err, AnomalyError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        assert!(AnomalyDetector::new(10, 0.0).is_err());
        assert!(AnomalyDetector::new(10, -3.0).is_err());
    }

    #[test]
    fn test_default_config() {
        let detector = AnomalyDetector::default();
        assert_eq!(detector.window_size(), 30);
        assert_eq!(detector.threshold(), 3.0);
        assert_eq!(detector.phase(), DetectorPhase::Filling);
    }

    #[test]
    fn test_no_record_while_filling_or_seeding() {
        let mut detector = AnomalyDetector::new(4, 3.0).unwrap();
        let out = feed(&mut detector, &[1.0, 2.0, 3.0]);
        assert!(out.iter().all(Option::is_none));
        assert_eq!(detector.phase(), DetectorPhase::Filling);

        // The value that fills the window seeds but is not scored.
        assert!(detector.process(4.0).is_none());
        assert_eq!(detector.phase(), DetectorPhase::Streaming);
        assert!((detector.statistics().mean() - 2.5).abs() < 1e-12);

        let record = detector.process(5.0).expect("streaming tick is classified");
        assert_eq!(record.tick, 5);
    }

    #[test]
    fn test_window_length_invariant() {
        let window_size = 6;
        let mut detector = AnomalyDetector::new(window_size, 3.0).unwrap();
        for n in 1..=50u64 {
            detector.process(n as f64);
            assert_eq!(detector.len(), (n as usize).min(window_size));
            assert_eq!(detector.ticks_seen(), n);
        }
        let window: Vec<f64> = detector.window().collect();
        assert_eq!(window, vec![45.0, 46.0, 47.0, 48.0, 49.0, 50.0]);
    }

    #[test]
    fn test_constant_stream_is_degenerate() {
        let mut detector = AnomalyDetector::new(10, 3.0).unwrap();
        let records: Vec<_> = (0..100).filter_map(|_| detector.process(4.2)).collect();
        assert_eq!(records.len(), 90);
        for record in records {
            assert_eq!(record.std_dev, 0.0);
            assert_eq!(record.zscore, 0.0);
            assert!(!record.is_anomaly);
            assert!(record.is_degenerate());
        }
    }

    #[test]
    fn test_all_zero_window_is_seeded() {
        let mut detector = AnomalyDetector::new(3, 3.0).unwrap();
        feed(&mut detector, &[0.0, 0.0, 0.0]);
        assert_eq!(detector.phase(), DetectorPhase::Streaming);
        let record = detector.process(0.0).unwrap();
        assert_eq!(record.zscore, 0.0);
    }

    #[test]
    fn test_spike_in_window_of_five() {
        // A single outlier among n values can reach at most sqrt(n - 1).
        let mut detector = AnomalyDetector::new(5, 1.5).unwrap();
        let out = feed(
            &mut detector,
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 50.0, 1.0, 1.0, 1.0],
        );
        let records: Vec<_> = out.into_iter().flatten().collect();
        assert_eq!(records.len(), 5);

        assert_eq!(records[0].zscore, 0.0);
        let spike = records[1];
        assert_eq!(spike.value, 50.0);
        assert!((spike.zscore - 2.0).abs() < 1e-9);
        assert!(spike.is_anomaly);

        for record in &records[2..] {
            assert!((record.zscore + 0.5).abs() < 1e-9);
            assert!(!record.is_anomaly);
        }
    }

    #[test]
    fn test_spike_clears_threshold_three_with_wider_window() {
        let mut detector = AnomalyDetector::new(12, 3.0).unwrap();
        let mut values = vec![1.0; 13];
        values.push(50.0);
        values.extend(std::iter::repeat(1.0).take(14));

        let records: Vec<_> = feed(&mut detector, &values).into_iter().flatten().collect();
        let spike = records.iter().find(|r| r.value == 50.0).unwrap();
        assert!(spike.zscore > 3.0);
        assert!(spike.is_anomaly);
        assert_eq!(records.iter().filter(|r| r.is_anomaly).count(), 1);

        // Once the spike has left the window the stream is flat again.
        assert!(!records.last().unwrap().is_anomaly);
        detector.resync();
        let record = detector.process(1.0).unwrap();
        assert_eq!(record.mean, 1.0);
        assert_eq!(record.zscore, 0.0);
    }

    #[test]
    fn test_constant_stream_is_degenerate_at_low_threshold() {
        for (window_size, value) in [(10, 4.2), (30, 0.1), (3, 0.1), (7, 1.1)] {
            let mut detector = AnomalyDetector::new(window_size, 0.5).unwrap();
            let records: Vec<_> = (0..100).filter_map(|_| detector.process(value)).collect();
            assert_eq!(records.len(), 100 - window_size);
            for record in records {
                assert_eq!(record.mean, value);
                assert_eq!(record.zscore, 0.0, "window {window_size} of {value}");
                assert!(!record.is_anomaly);
            }
        }
    }

    #[test]
    fn test_nan_scores_are_non_anomalous_while_in_window() {
        let mut detector = AnomalyDetector::new(4, 3.0).unwrap();
        feed(&mut detector, &[1.0, 2.0, 1.0, 2.0]);

        let record = detector.process(f64::NAN).unwrap();
        assert!(record.zscore.is_nan());
        assert!(!record.is_anomaly);

        // Three more ticks keep the NaN inside the window.
        for record in feed(&mut detector, &[1.0, 2.0, 1.0]) {
            let record = record.unwrap();
            assert!(record.mean.is_nan());
            assert!(record.zscore.is_nan());
            assert!(!record.is_anomaly);
        }

        // The NaN leaves on the next tick and statistics are rebuilt.
        let record = detector.process(2.0).unwrap();
        assert!((record.mean - 1.5).abs() < 1e-12);
        assert!((record.zscore - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nan_during_filling_recovers_once_evicted() {
        let mut detector = AnomalyDetector::new(4, 3.0).unwrap();
        let out = feed(&mut detector, &[f64::NAN, 1.0, 1.0, 1.0, 1.0]);
        assert!(out[..4].iter().all(Option::is_none));

        let record = out[4].unwrap();
        assert_eq!(record.mean, 1.0);
        assert_eq!(record.zscore, 0.0);
        assert!(!record.is_anomaly);
    }

    #[test]
    fn test_spike_flagged_after_non_finite_value_leaves() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut detector = AnomalyDetector::new(4, 1.5).unwrap();
            feed(&mut detector, &[1.0, 2.0, 1.0, 2.0, bad]);
            for i in 0..100 {
                detector.process(if i % 2 == 0 { 1.0 } else { 2.0 });
            }

            let spike = detector.process(1000.0).unwrap();
            assert!(spike.zscore.is_finite(), "still poisoned after {bad}");
            assert!(spike.zscore > 1.5);
            assert!(spike.is_anomaly);
        }
    }

    #[test]
    fn test_infinity_does_not_panic() {
        let mut detector = AnomalyDetector::new(3, 3.0).unwrap();
        feed(&mut detector, &[1.0, 2.0, 3.0]);
        let record = detector.process(f64::INFINITY).unwrap();
        assert!(record.is_undefined());
        assert!(!record.is_anomaly);
    }

    #[test]
    fn test_resync_interval_reseeds_every_tick() {
        let config = DetectorConfig::builder()
            .window_size(4)
            .resync_interval(1)
            .build()
            .unwrap();
        let mut detector = AnomalyDetector::from_config(config).unwrap();
        let out = feed(&mut detector, &[3.0, 1.0, 1.0, 1.0, 1.0, 5.0]);
        assert_eq!(out[4].unwrap().mean, 1.0);

        // Window [1, 1, 1, 5] computed directly.
        let record = out[5].unwrap();
        assert_eq!(record.mean, 2.0);
        assert!((record.std_dev - 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_track_window_over_long_run() {
        let window_size = 30;
        let mut detector = AnomalyDetector::new(window_size, 3.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10_000 {
            detector.process(rng.gen_range(-50.0..50.0));
        }

        let window: Vec<f64> = detector.window().collect();
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let stats = detector.statistics();
        assert!((stats.mean() - mean).abs() <= 1e-9 * mean.abs().max(1.0));
        assert!((stats.variance() - variance).abs() <= 1e-9 * variance.max(1.0));
    }

    #[test]
    fn test_manual_resync_before_full_is_noop() {
        let mut detector = AnomalyDetector::new(3, 3.0).unwrap();
        detector.process(1.0);
        detector.resync();
        assert_eq!(detector.phase(), DetectorPhase::Filling);
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn test_reset_returns_to_filling() {
        let mut detector = AnomalyDetector::new(3, 3.0).unwrap();
        feed(&mut detector, &[1.0, 2.0, 3.0, 4.0]);
        detector.reset();
        assert_eq!(detector.phase(), DetectorPhase::Filling);
        assert!(detector.is_empty());
        assert_eq!(detector.ticks_seen(), 0);
        assert!(detector.process(1.0).is_none());
    }

    #[test]
    fn test_detector_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AnomalyDetector>();
    }
}
