//! Anomaly Detection Service Provider Interface
//!
//! Defines the contracts between a streaming detector, the data source that
//! feeds it and the sinks that consume its output.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{MonitoringStream, RecordSink, StreamingDetector};
pub use error::{AnomalyError, Result};
pub use model::{Alert, AlertSeverity, AnomalyRecord, DetectorPhase, RunSummary};
