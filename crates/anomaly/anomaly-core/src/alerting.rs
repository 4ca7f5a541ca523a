//! Alerting system implementation.

use anomaly_api::AlertConfig;
use anomaly_spi::{Alert, AlertSeverity, AnomalyRecord};

/// Create an alert for a classified record.
pub fn create_alert(record: &AnomalyRecord, config: &AlertConfig) -> Alert {
    AlertBuilder::new(record).critical_zscore(config.critical_zscore).build()
}

/// Alert builder for custom alert creation.
#[derive(Debug, Clone)]
pub struct AlertBuilder {
    tick: u64,
    value: f64,
    zscore: f64,
    critical_zscore: f64,
    severity: Option<AlertSeverity>,
    message: Option<String>,
}

impl AlertBuilder {
    /// Create a new alert builder for a record.
    pub fn new(record: &AnomalyRecord) -> Self {
        Self {
            tick: record.tick,
            value: record.value,
            zscore: record.zscore,
            critical_zscore: AlertConfig::default().critical_zscore,
            severity: None,
            message: None,
        }
    }

    /// Z-score magnitude above which the derived severity is critical.
    pub fn critical_zscore(mut self, critical_zscore: f64) -> Self {
        self.critical_zscore = critical_zscore;
        self
    }

    /// Set custom severity.
    pub fn severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Set custom message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Build the alert.
    pub fn build(self) -> Alert {
        let severity = self.severity.unwrap_or_else(|| {
            if self.zscore.abs() > self.critical_zscore {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            }
        });

        let message = self.message.unwrap_or_else(|| {
            format!(
                "Anomaly detected! Data point: {:.4}, Z-Score: {:.4}",
                self.value, self.zscore
            )
        });

        Alert {
            tick: self.tick,
            value: self.value,
            zscore: self.zscore,
            severity,
            message,
        }
    }
}
