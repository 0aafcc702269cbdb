//! Building an [`Activity`] from the aggregate event stream.

use crossbeam_channel::Receiver;

use crate::activity::{Activity, Sample};
use crate::event::AggregateEvent;

/// Incrementally folds aggregate events into an activity.
#[derive(Debug, Default)]
pub struct EventCollector {
    activity: Option<Activity>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a single aggregate event. The first event fixes the start time.
    pub fn collect(&mut self, event: AggregateEvent) {
        let activity = self.activity.get_or_insert_with(|| {
            tracing::debug!(start_time_ms = event.time_ms, "activity started");
            Activity {
                start_time_ms: event.time_ms,
                samples: Vec::new(),
            }
        });
        if let Some(last) = activity.samples.last() {
            if event.time_ms < last.time_ms {
                tracing::warn!(
                    time_ms = event.time_ms,
                    previous_ms = last.time_ms,
                    "aggregate event out of order"
                );
            }
        }
        activity.samples.push(Sample::from(event));
    }

    /// Consumes events until every sender has been dropped.
    #[must_use]
    pub fn run(mut self, events: Receiver<AggregateEvent>) -> Self {
        for event in events {
            self.collect(event);
        }
        tracing::debug!(
            samples = self.activity.as_ref().map_or(0, |a| a.samples.len()),
            "aggregate stream closed"
        );
        self
    }

    /// The collected activity, or `None` if no events were observed.
    pub fn activity(self) -> Option<Activity> {
        self.activity
    }
}
