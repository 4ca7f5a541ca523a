//! Anomaly Detection API
//!
//! Configuration types and builders for streaming anomaly detection.

use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use anomaly_spi::{
    Alert, AlertSeverity, AnomalyError, AnomalyRecord, DetectorPhase, Result, RunSummary,
};

/// Smallest window for which a standard deviation is meaningful.
pub const MIN_WINDOW_SIZE: usize = 2;

// ============================================================================
// Detector Configuration
// ============================================================================

/// Rolling z-score detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of most recent values the statistics are computed over (default: 30).
    pub window_size: usize,
    /// Z-score magnitude above which a value is an anomaly (default: 3.0).
    pub threshold: f64,
    /// Recompute mean and variance directly every this many streaming ticks
    /// instead of incrementally. `None` never resynchronizes.
    pub resync_interval: Option<usize>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            threshold: 3.0,
            resync_interval: None,
        }
    }
}

impl DetectorConfig {
    pub fn new(window_size: usize, threshold: f64) -> Self {
        Self {
            window_size,
            threshold,
            resync_interval: None,
        }
    }

    /// Start a builder from the defaults.
    pub fn builder() -> DetectorConfigBuilder {
        DetectorConfigBuilder::new()
    }

    /// Check every field, reporting the first invalid one.
    pub fn validate(&self) -> Result<()> {
        if self.window_size < MIN_WINDOW_SIZE {
            return Err(AnomalyError::invalid_parameter(
                "window_size",
                format!("must be at least {MIN_WINDOW_SIZE}, got {}", self.window_size),
            ));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(AnomalyError::invalid_parameter(
                "threshold",
                format!("must be a positive finite number, got {}", self.threshold),
            ));
        }
        if self.resync_interval == Some(0) {
            return Err(AnomalyError::invalid_parameter(
                "resync_interval",
                "must be positive when set",
            ));
        }
        Ok(())
    }
}

/// Builder for [`DetectorConfig`].
#[derive(Debug, Default)]
pub struct DetectorConfigBuilder {
    window_size: Option<usize>,
    threshold: Option<f64>,
    resync_interval: Option<usize>,
}

impl DetectorConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window size.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = Some(window_size);
        self
    }

    /// Set the z-score threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Resynchronize statistics every `ticks` streaming ticks.
    pub fn resync_interval(mut self, ticks: usize) -> Self {
        self.resync_interval = Some(ticks);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<DetectorConfig> {
        let defaults = DetectorConfig::default();
        let config = DetectorConfig {
            window_size: self.window_size.unwrap_or(defaults.window_size),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            resync_interval: self.resync_interval,
        };
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Source Configuration
// ============================================================================

/// Synthetic sine-plus-noise source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Peak amplitude of the seasonal component (default: 1.0).
    pub amplitude: f64,
    /// Angular frequency of the seasonal component in radians per second (default: 1.0).
    pub frequency: f64,
    /// Standard deviation of the gaussian noise (default: 0.1).
    pub noise_std: f64,
    /// Logical time between ticks in milliseconds (default: 100).
    pub tick_interval_ms: u64,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 1.0,
            noise_std: 0.1,
            tick_interval_ms: 100,
            seed: None,
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(AnomalyError::invalid_parameter(
                "noise_std",
                "must be a non-negative finite number",
            ));
        }
        if !self.amplitude.is_finite() || !self.frequency.is_finite() {
            return Err(AnomalyError::invalid_parameter(
                "amplitude/frequency",
                "must be finite",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Alert Configuration
// ============================================================================

/// Alert severity configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Z-score magnitude above which an alert is critical (default: 5.0).
    pub critical_zscore: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            critical_zscore: 5.0,
        }
    }
}

impl AlertConfig {
    pub fn new(critical_zscore: f64) -> Self {
        Self { critical_zscore }
    }
}

// ============================================================================
// Combined Configuration
// ============================================================================

/// Everything needed to run a stream end to end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub detector: DetectorConfig,
    pub source: SourceConfig,
    pub alert: AlertConfig,
}

impl StreamConfig {
    /// Parse from JSON. Missing sections and fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AnomalyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.source.validate()
    }
}
