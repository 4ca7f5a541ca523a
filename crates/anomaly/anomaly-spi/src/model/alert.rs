//! Alert types for anomaly detection.

use serde::{Deserialize, Serialize};

/// Alert severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// An alert raised for a point classified as anomalous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Tick at which the anomalous value arrived (1-based).
    pub tick: u64,
    pub value: f64,
    pub zscore: f64,
    pub severity: AlertSeverity,
    pub message: String,
}
