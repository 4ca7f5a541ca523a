//! Streaming detector trait definitions.

use crate::error::Result;
use crate::model::{AnomalyRecord, DetectorPhase};

/// Online detector that classifies one value per call.
///
/// Implementations own all of their state; independent streams use
/// independent instances.
pub trait StreamingDetector: Send {
    /// Feed the next stream value.
    ///
    /// Returns `None` while the detector is still warming up, and a record
    /// for every value once it is streaming. Never fails on numeric input.
    fn process(&mut self, value: f64) -> Option<AnomalyRecord>;

    /// Current lifecycle phase.
    fn phase(&self) -> DetectorPhase;

    /// Number of values processed since construction or the last reset.
    fn ticks_seen(&self) -> u64;

    /// Drop all buffered values and statistics.
    fn reset(&mut self);
}

/// Real-time monitoring trait: a detector wired to an output.
pub trait MonitoringStream<D: StreamingDetector> {
    /// Push a new value, emitting its record downstream if one is produced.
    fn push(&mut self, value: f64) -> Result<Option<AnomalyRecord>>;

    /// Access the underlying detector.
    fn detector(&self) -> &D;

    /// Reset the monitor state.
    fn reset(&mut self);
}
