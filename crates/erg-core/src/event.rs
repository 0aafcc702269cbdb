//! Events flowing through the import pipeline.

use serde::{Deserialize, Serialize};

use crate::metric::{Metric, UnknownMetric};

/// One raw sample from the monitor: a counter changed to `value` at `time_ms`.
///
/// Atomic events are serialized as one compact JSON object per line, which is
/// both the raw log input format and what [`RawLogger`](crate::RawLogger) writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicEvent {
    /// Milliseconds since the Unix epoch when the change was recorded.
    pub time_ms: i64,
    /// Counter label, usually one of the [`Metric`] labels.
    pub label: String,
    /// New counter value.
    pub value: u64,
}

impl AtomicEvent {
    pub fn new(time_ms: i64, label: impl Into<String>, value: u64) -> Self {
        Self {
            time_ms,
            label: label.into(),
            value,
        }
    }

    /// Parses the label as a known metric.
    pub fn metric(&self) -> Result<Metric, UnknownMetric> {
        self.label.parse()
    }
}

/// A derived sample covering the atomic events since the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEvent {
    pub time_ms: i64,
    /// Distance at the previous aggregate.
    pub start_distance_m: u64,
    /// Distance at this aggregate.
    pub total_distance_m: u64,
    pub stroke_rate: u64,
    pub total_strokes: u64,
    pub watts: u64,
    pub calories: u64,
    pub heart_rate: u64,
    pub speed_m_s: f64,
}
