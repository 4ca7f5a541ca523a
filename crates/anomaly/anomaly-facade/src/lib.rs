//! Anomaly Detection Facade
//!
//! Unified re-exports for the streaming anomaly detection module.
//!
//! This facade provides a single entry point to all functionality:
//! - `StreamingDetector`, `RecordSink` and `AnomalyRecord` from SPI
//! - Configuration types from API
//! - `AnomalyDetector`, `RollingStatistics`, `Monitor`, sinks and sources from Core

// Re-export everything from SPI
pub use anomaly_spi::*;

// Re-export everything from API
pub use anomaly_api::*;

// Re-export everything from Core
pub use anomaly_core::*;
