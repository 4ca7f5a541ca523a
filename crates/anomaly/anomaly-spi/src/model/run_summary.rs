//! Aggregate counters for a monitoring run.

use serde::{Deserialize, Serialize};

/// Counts accumulated while a monitor drives a detector over a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Values pulled from the source.
    pub ticks: u64,
    /// Values that produced a classification record.
    pub classified: u64,
    /// Records flagged as anomalies.
    pub anomalies: u64,
    /// Records the sink failed to accept.
    pub failed_emissions: u64,
}

impl RunSummary {
    /// Fraction of classified points flagged as anomalous.
    pub fn anomaly_rate(&self) -> f64 {
        if self.classified == 0 {
            return 0.0;
        }
        self.anomalies as f64 / self.classified as f64
    }
}
