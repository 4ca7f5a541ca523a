//! Per-tick classification output.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a rolling-window detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorPhase {
    /// The window holds fewer than `window_size` values; nothing is scored.
    Filling,
    /// The window has been full at least once and statistics are seeded.
    Streaming,
}

/// Classification of a single stream value.
///
/// Records are only produced once the detector is streaming. They are not
/// retained by the detector; a sink that wants history keeps its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// 1-based position of the value in the stream.
    pub tick: u64,
    /// The observed value.
    #[serde(with = "float_repr")]
    pub value: f64,
    /// Deviation from the window mean in standard deviations.
    ///
    /// Defined as `0.0` when the window's standard deviation is exactly zero.
    #[serde(with = "float_repr")]
    pub zscore: f64,
    /// Whether `|zscore|` exceeded the detector threshold.
    pub is_anomaly: bool,
    /// Window mean the value was scored against.
    #[serde(with = "float_repr")]
    pub mean: f64,
    /// Window standard deviation the value was scored against.
    #[serde(with = "float_repr")]
    pub std_dev: f64,
}

impl AnomalyRecord {
    /// True when the window was perfectly flat and the z-score was pinned to zero.
    pub fn is_degenerate(&self) -> bool {
        self.std_dev == 0.0
    }

    /// True when the z-score is not a finite number (NaN or infinite input upstream).
    pub fn is_undefined(&self) -> bool {
        !self.zscore.is_finite()
    }
}

/// JSON has no NaN or infinity: write them as `"NaN"`, `"inf"`, `"-inf"`
/// and accept those strings, plain numbers or `null` (read as NaN).
mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(f64::NAN),
            Some(Repr::Number(value)) => Ok(value),
            Some(Repr::Text(text)) => text
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("not a number: {text:?}"))),
        }
    }
}
