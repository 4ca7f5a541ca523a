//! Synthetic data sources.

use std::thread;
use std::time::{Duration, Instant};

use anomaly_api::SourceConfig;
use anomaly_spi::{AnomalyError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

// ============================================================================
// Sine + Noise Source
// ============================================================================

/// Infinite stream of `amplitude * sin(frequency * t) + noise`.
///
/// `t` advances by `tick_interval_ms` per value on a logical clock starting
/// at zero, so the same seed always produces the same sequence.
#[derive(Debug, Clone)]
pub struct SineNoiseSource {
    amplitude: f64,
    frequency: f64,
    step_secs: f64,
    noise: Normal<f64>,
    rng: StdRng,
    tick: u64,
}

impl SineNoiseSource {
    /// Create from configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate()?;
        let noise = Normal::new(0.0, config.noise_std)
            .map_err(|e| AnomalyError::invalid_parameter("noise_std", e.to_string()))?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            amplitude: config.amplitude,
            frequency: config.frequency,
            step_secs: config.tick_interval_ms as f64 / 1000.0,
            noise,
            rng,
            tick: 0,
        })
    }

    /// Deterministic source with default shape and the given seed.
    pub fn seeded(seed: u64) -> Self {
        let config = SourceConfig {
            seed: Some(seed),
            ..SourceConfig::default()
        };
        Self::from_config(&config).unwrap()
    }

    /// Number of values produced so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }
}

impl Iterator for SineNoiseSource {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let t = self.tick as f64 * self.step_secs;
        self.tick += 1;
        let seasonal = self.amplitude * (self.frequency * t).sin();
        Some(seasonal + self.noise.sample(&mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ============================================================================
// Spike Injection
// ============================================================================

/// Adds `magnitude` to every `every`-th value of the inner source.
#[derive(Debug, Clone)]
pub struct SpikeInjector<I> {
    inner: I,
    every: u64,
    magnitude: f64,
    position: u64,
}

impl<I: Iterator<Item = f64>> SpikeInjector<I> {
    pub fn new(inner: I, every: u64, magnitude: f64) -> Result<Self> {
        if every == 0 {
            return Err(AnomalyError::invalid_parameter("every", "must be positive"));
        }
        Ok(Self {
            inner,
            every,
            magnitude,
            position: 0,
        })
    }
}

impl<I: Iterator<Item = f64>> Iterator for SpikeInjector<I> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let value = self.inner.next()?;
        self.position += 1;
        if self.position % self.every == 0 {
            Some(value + self.magnitude)
        } else {
            Some(value)
        }
    }
}

// ============================================================================
// Pacing
// ============================================================================

/// Yields inner values no faster than one per `interval` of wall-clock time.
#[derive(Debug)]
pub struct Paced<I> {
    inner: I,
    interval: Duration,
    last: Option<Instant>,
}

impl<I: Iterator> Paced<I> {
    pub fn new(inner: I, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last: None,
        }
    }
}

impl<I: Iterator> Iterator for Paced<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
        self.inner.next()
    }
}
