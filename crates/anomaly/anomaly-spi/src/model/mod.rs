//! Data models for anomaly detection.
//!
//! This module contains data structures used throughout the anomaly detection system.

mod alert;
mod anomaly_record;
mod run_summary;

pub use alert::{Alert, AlertSeverity};
pub use anomaly_record::{AnomalyRecord, DetectorPhase};
pub use run_summary::RunSummary;
