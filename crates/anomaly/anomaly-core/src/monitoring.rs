//! Real-time monitoring implementation.

use anomaly_spi::{
    AnomalyRecord, MonitoringStream, RecordSink, Result, RunSummary, StreamingDetector,
};
use tracing::{info, warn};

/// Drives a detector and hands each classification to a sink.
///
/// The detector always processes a value before the sink sees its record,
/// so a failing sink can never leave the window half-updated.
pub struct Monitor<D: StreamingDetector, S: RecordSink> {
    detector: D,
    sink: S,
    summary: RunSummary,
}

impl<D: StreamingDetector, S: RecordSink> Monitor<D, S> {
    /// Create a new monitor with the given detector and sink.
    pub fn new(detector: D, sink: S) -> Self {
        Self {
            detector,
            sink,
            summary: RunSummary::default(),
        }
    }

    /// Get mutable reference to the detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Counters accumulated since construction or the last reset.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Pull values from `source` until it ends or `limit` values were read.
    ///
    /// Sink failures are logged and counted, and the run continues with the
    /// next value.
    pub fn run<I>(&mut self, source: I, limit: Option<u64>) -> RunSummary
    where
        I: IntoIterator<Item = f64>,
    {
        let source = source.into_iter();
        let values: Box<dyn Iterator<Item = f64>> = match limit {
            Some(limit) => {
                let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                Box::new(source.take(limit))
            }
            None => Box::new(source),
        };

        for value in values {
            if let Err(err) = self.push(value) {
                warn!(%err, tick = self.detector.ticks_seen(), "record dropped");
            }
        }

        if let Err(err) = self.sink.flush() {
            warn!(%err, "sink flush failed");
        }
        info!(
            ticks = self.summary.ticks,
            classified = self.summary.classified,
            anomalies = self.summary.anomalies,
            "stream finished"
        );
        self.summary
    }

    /// Split into the detector and the sink.
    pub fn into_parts(self) -> (D, S) {
        (self.detector, self.sink)
    }
}

impl<D: StreamingDetector, S: RecordSink> MonitoringStream<D> for Monitor<D, S> {
    fn push(&mut self, value: f64) -> Result<Option<AnomalyRecord>> {
        self.summary.ticks += 1;
        let Some(record) = self.detector.process(value) else {
            return Ok(None);
        };

        self.summary.classified += 1;
        if record.is_anomaly {
            self.summary.anomalies += 1;
        }

        if let Err(err) = self.sink.emit(&record) {
            self.summary.failed_emissions += 1;
            return Err(err);
        }
        Ok(Some(record))
    }

    fn detector(&self) -> &D {
        &self.detector
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.summary = RunSummary::default();
    }
}
