//! Folding atomic counter changes into per-distance samples.
//!
//! The monitor reports each counter independently whenever it changes. The
//! aggregator keeps the latest value of every known counter and emits one
//! [`AggregateEvent`] each time the distance counter advances, so every
//! aggregate covers the span between two distinct distance readings.

use crate::event::{AggregateEvent, AtomicEvent};
use crate::metric::Metric;

/// Speed is reported by the monitor in centimetres per second.
const CM_PER_M: f64 = 100.0;

/// Latest counter values seen so far.
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    distance_m: Option<u64>,
    stroke_rate: u64,
    total_strokes: u64,
    watts: u64,
    calories: u64,
    heart_rate: u64,
    speed_cmps: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one atomic event, returning an aggregate when distance advances.
    pub fn push(&mut self, event: &AtomicEvent) -> Option<AggregateEvent> {
        let Ok(metric) = event.metric() else {
            tracing::trace!(label = %event.label, "ignoring unknown label");
            return None;
        };

        match metric {
            Metric::TotalDistance => return self.advance_distance(event),
            Metric::StrokeRate => self.stroke_rate = event.value,
            Metric::TotalStrokes => self.total_strokes = event.value,
            Metric::Watts => self.watts = event.value,
            Metric::Calories => self.calories = event.value,
            Metric::HeartRate => self.heart_rate = event.value,
            Metric::Speed => self.speed_cmps = event.value,
        }
        None
    }

    fn advance_distance(&mut self, event: &AtomicEvent) -> Option<AggregateEvent> {
        let start_distance_m = self.distance_m.unwrap_or(0);
        if self.distance_m.is_some() && event.value <= start_distance_m {
            // Repeated or reset readings do not start a new span.
            return None;
        }
        if self.distance_m.is_none() && event.value == 0 {
            self.distance_m = Some(0);
            return None;
        }
        self.distance_m = Some(event.value);

        #[expect(
            clippy::cast_precision_loss,
            reason = "monitor speed readings fit in 16 bits"
        )]
        let speed_m_s = self.speed_cmps as f64 / CM_PER_M;

        Some(AggregateEvent {
            time_ms: event.time_ms,
            start_distance_m,
            total_distance_m: event.value,
            stroke_rate: self.stroke_rate,
            total_strokes: self.total_strokes,
            watts: self.watts,
            calories: self.calories,
            heart_rate: self.heart_rate,
            speed_m_s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(aggregator: &mut Aggregator, events: &[AtomicEvent]) -> Vec<AggregateEvent> {
        events.iter().filter_map(|e| aggregator.push(e)).collect()
    }

    #[test]
    fn emits_one_aggregate_per_distance_increase() {
        let mut aggregator = Aggregator::new();
        let out = push_all(
            &mut aggregator,
            &[
                AtomicEvent::new(0, "total_distance_m", 0),
                AtomicEvent::new(100, "stroke_rate", 22),
                AtomicEvent::new(200, "watts", 150),
                AtomicEvent::new(300, "total_distance_m", 1),
                AtomicEvent::new(400, "total_distance_m", 1),
                AtomicEvent::new(500, "avg_distance_cmps", 250),
                AtomicEvent::new(600, "total_distance_m", 3),
            ],
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].time_ms, 300);
        assert_eq!(out[0].start_distance_m, 0);
        assert_eq!(out[0].total_distance_m, 1);
        assert_eq!(out[0].stroke_rate, 22);
        assert_eq!(out[0].watts, 150);
        assert_eq!(out[1].start_distance_m, 1);
        assert_eq!(out[1].total_distance_m, 3);
        assert!((out[1].speed_m_s - 2.5).abs() < 1e-9);
    }

    #[test]
    fn first_nonzero_distance_starts_from_zero() {
        let mut aggregator = Aggregator::new();
        let out = push_all(&mut aggregator, &[AtomicEvent::new(10, "total_distance_m", 5)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start_distance_m, 0);
        assert_eq!(out[0].total_distance_m, 5);
    }

    #[test]
    fn distance_going_backwards_is_ignored() {
        let mut aggregator = Aggregator::new();
        let out = push_all(
            &mut aggregator,
            &[
                AtomicEvent::new(10, "total_distance_m", 10),
                AtomicEvent::new(20, "total_distance_m", 4),
                AtomicEvent::new(30, "total_distance_m", 11),
            ],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].start_distance_m, 10);
    }

    #[test]
    fn counters_without_distance_emit_nothing() {
        let mut aggregator = Aggregator::new();
        let out = push_all(
            &mut aggregator,
            &[
                AtomicEvent::new(10, "heart_rate", 120),
                AtomicEvent::new(20, "total_kcal", 3),
                AtomicEvent::new(30, "tank_volume", 40),
            ],
        );
        assert!(out.is_empty());
    }
}
