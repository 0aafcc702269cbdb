//! Reconstructed workout sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::AggregateEvent;

/// One point of an activity, as derived by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time_ms: i64,
    pub start_distance_m: u64,
    pub total_distance_m: u64,
    pub stroke_rate: u64,
    pub total_strokes: u64,
    pub watts: u64,
    pub calories: u64,
    pub heart_rate: u64,
    pub speed_m_s: f64,
}

impl From<AggregateEvent> for Sample {
    fn from(event: AggregateEvent) -> Self {
        Self {
            time_ms: event.time_ms,
            start_distance_m: event.start_distance_m,
            total_distance_m: event.total_distance_m,
            stroke_rate: event.stroke_rate,
            total_strokes: event.total_strokes,
            watts: event.watts,
            calories: event.calories,
            heart_rate: event.heart_rate,
            speed_m_s: event.speed_m_s,
        }
    }
}

/// A rowing session: a start time and its samples in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Milliseconds since the Unix epoch of the first sample.
    pub start_time_ms: i64,
    pub samples: Vec<Sample>,
}

impl Activity {
    /// Start time as a UTC datetime, if representable.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_time_ms)
    }

    /// Time between the start and the last sample.
    pub fn duration_ms(&self) -> i64 {
        self.samples
            .last()
            .map_or(0, |s| s.time_ms.saturating_sub(self.start_time_ms).max(0))
    }

    /// Distance rowed during the session.
    pub fn distance_m(&self) -> u64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last
                .total_distance_m
                .saturating_sub(first.start_distance_m),
            _ => 0,
        }
    }

    pub fn calories(&self) -> u64 {
        self.samples.last().map_or(0, |s| s.calories)
    }

    pub fn stroke_count(&self) -> u64 {
        self.samples.last().map_or(0, |s| s.total_strokes)
    }

    pub fn max_heart_rate(&self) -> u64 {
        self.samples.iter().map(|s| s.heart_rate).max().unwrap_or(0)
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts and watt readings are far below 2^52"
    )]
    pub fn average_watts(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: u64 = self.samples.iter().map(|s| s.watts).sum();
        total as f64 / self.samples.len() as f64
    }

    /// Distance over elapsed time, in metres per second.
    #[expect(
        clippy::cast_precision_loss,
        reason = "session distances and durations are far below 2^52"
    )]
    pub fn average_speed_m_s(&self) -> f64 {
        let duration_ms = self.duration_ms();
        if duration_ms == 0 {
            return 0.0;
        }
        self.distance_m() as f64 * 1000.0 / duration_ms as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time_ms: i64, from: u64, to: u64, watts: u64, heart_rate: u64) -> Sample {
        Sample {
            time_ms,
            start_distance_m: from,
            total_distance_m: to,
            stroke_rate: 24,
            total_strokes: to / 10,
            watts,
            calories: to / 20,
            heart_rate,
            speed_m_s: 2.5,
        }
    }

    #[test]
    fn summary_of_empty_activity_is_zero() {
        let activity = Activity {
            start_time_ms: 1_000,
            samples: Vec::new(),
        };
        assert_eq!(activity.duration_ms(), 0);
        assert_eq!(activity.distance_m(), 0);
        assert!(activity.average_watts().abs() < f64::EPSILON);
        assert!(activity.average_speed_m_s().abs() < f64::EPSILON);
    }

    #[test]
    fn summary_uses_first_and_last_samples() {
        let activity = Activity {
            start_time_ms: 10_000,
            samples: vec![
                sample(10_000, 0, 100, 150, 120),
                sample(30_000, 100, 200, 170, 140),
                sample(50_000, 200, 300, 160, 135),
            ],
        };
        assert_eq!(activity.duration_ms(), 40_000);
        assert_eq!(activity.distance_m(), 300);
        assert_eq!(activity.calories(), 15);
        assert_eq!(activity.stroke_count(), 30);
        assert_eq!(activity.max_heart_rate(), 140);
        assert!((activity.average_watts() - 160.0).abs() < 1e-9);
        assert!((activity.average_speed_m_s() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn duration_saturates_on_extreme_timestamps() {
        let activity = Activity {
            start_time_ms: -8_000_000_000_000_000,
            samples: vec![
                sample(-8_000_000_000_000_000, 0, 1, 150, 120),
                sample(i64::MAX, 1, 2, 150, 120),
            ],
        };
        assert_eq!(activity.duration_ms(), i64::MAX);
        assert!(activity.average_speed_m_s() >= 0.0);
    }

    #[test]
    fn start_time_converts_to_utc() {
        let activity = Activity {
            start_time_ms: 1_709_278_200_000,
            samples: Vec::new(),
        };
        let start = activity.start_time().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T07:30:00+00:00");
    }
}
