//! Record sinks: where classified points go.

use std::collections::VecDeque;
use std::io::Write;

use anomaly_api::AlertConfig;
use anomaly_spi::{Alert, AlertSeverity, AnomalyError, AnomalyRecord, RecordSink, Result};
use tracing::{error, warn};

use crate::alerting::create_alert;

// ============================================================================
// History Sink
// ============================================================================

/// Keeps the full stream and its anomaly points, e.g. for later plotting.
///
/// `anomaly_points[i]` is `Some(values[i])` when that point was flagged.
#[derive(Debug, Clone, Default)]
pub struct HistorySink {
    values: VecDeque<f64>,
    anomaly_points: VecDeque<Option<f64>>,
    capacity: Option<usize>,
}

impl HistorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` of the most recent records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            anomaly_points: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Retained values, oldest first.
    pub fn values(&self) -> &VecDeque<f64> {
        &self.values
    }

    pub fn anomaly_points(&self) -> &VecDeque<Option<f64>> {
        &self.anomaly_points
    }

    /// Positions (within the retained history) of flagged points.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.anomaly_points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|_| i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.anomaly_points.clear();
    }
}

impl RecordSink for HistorySink {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Ok(());
            }
            if self.values.len() == capacity {
                self.values.pop_front();
                self.anomaly_points.pop_front();
            }
        }
        self.values.push_back(record.value);
        self.anomaly_points.push_back(record.is_anomaly.then_some(record.value));
        Ok(())
    }
}

// ============================================================================
// Vec Sink
// ============================================================================

/// Collects every record as-is.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    records: Vec<AnomalyRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AnomalyRecord> {
        self.records
    }
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        self.records.push(*record);
        Ok(())
    }
}

// ============================================================================
// Log Sink
// ============================================================================

/// Logs an alert through `tracing` for every anomalous record.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    config: AlertConfig,
    alerts: Vec<Alert>,
    keep_alerts: bool,
}

impl LogSink {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            alerts: Vec::new(),
            keep_alerts: false,
        }
    }

    /// Also retain every raised alert in memory.
    pub fn retain_alerts(mut self) -> Self {
        self.keep_alerts = true;
        self
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }
}

impl RecordSink for LogSink {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        if !record.is_anomaly {
            return Ok(());
        }
        let alert = create_alert(record, &self.config);
        match alert.severity {
            AlertSeverity::Critical => error!(tick = alert.tick, "{}", alert.message),
            AlertSeverity::Warning => warn!(tick = alert.tick, "{}", alert.message),
        }
        if self.keep_alerts {
            self.alerts.push(alert);
        }
        Ok(())
    }
}

// ============================================================================
// JSON Lines Sink
// ============================================================================

/// Writes one JSON object per record to any writer.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    anomalies_only: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            anomalies_only: false,
        }
    }

    /// Skip records that were not flagged.
    pub fn anomalies_only(mut self, anomalies_only: bool) -> Self {
        self.anomalies_only = anomalies_only;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        if self.anomalies_only && !record.is_anomaly {
            return Ok(());
        }
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| AnomalyError::Sink(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| AnomalyError::Sink(e.to_string()))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| AnomalyError::Sink(e.to_string()))
    }
}

// ============================================================================
// Fan-out
// ============================================================================

/// Forwards each record to several sinks in order.
///
/// Every sink sees every record; the first error is returned after all have
/// been tried.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn RecordSink + Send>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl RecordSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for FanOutSink {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.emit(record) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn flush(&mut self) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.flush() {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
