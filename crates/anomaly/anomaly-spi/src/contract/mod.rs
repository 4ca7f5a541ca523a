//! Contract definitions for anomaly detection.
//!
//! This module contains trait definitions that providers must implement.

mod record_sink;
mod streaming_detector;

pub use record_sink::RecordSink;
pub use streaming_detector::{MonitoringStream, StreamingDetector};
