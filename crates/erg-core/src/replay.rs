//! Replaying a raw log into the atomic and aggregate event streams.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::aggregator::Aggregator;
use crate::error::PipelineError;
use crate::event::{AggregateEvent, AtomicEvent};

/// Counts reported by a completed replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub atomic_events: u64,
    pub aggregate_events: u64,
}

/// Producer side of the import pipeline.
///
/// Decodes one [`AtomicEvent`] per non-blank line of the input and derives
/// aggregates through an [`Aggregator`]. In replay mode, emission is paced so
/// the gaps between published events follow the recorded timestamps.
#[derive(Debug)]
pub struct ReplayEngine {
    path: PathBuf,
    reader: BufReader<File>,
    replay: bool,
    aggregator: Aggregator,
}

impl ReplayEngine {
    /// Opens the raw log at `path`.
    pub fn open(path: &Path, replay: bool) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            replay,
            aggregator: Aggregator::new(),
        })
    }

    /// Publishes every record, blocking until the input is exhausted.
    ///
    /// Both senders are dropped when this returns, which closes the streams
    /// for the consumers whether the run succeeded or not.
    pub fn run(
        self,
        atomic_tx: Sender<AtomicEvent>,
        aggregate_tx: Sender<AggregateEvent>,
    ) -> Result<ReplayStats, PipelineError> {
        let Self {
            path,
            reader,
            replay,
            mut aggregator,
        } = self;
        let mut stats = ReplayStats::default();
        let mut previous_ms: Option<i64> = None;

        // Records are decoded from raw bytes so invalid UTF-8 is a decode error.
        for (idx, line) in reader.split(b'\n').enumerate() {
            let line = line.map_err(|e| PipelineError::io(&path, e))?;
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            let event: AtomicEvent = serde_json::from_slice(trimmed)
                .map_err(|source| PipelineError::Decode {
                    line: idx + 1,
                    source,
                })?;

            if replay {
                if let Some(previous_ms) = previous_ms {
                    pace(event.time_ms.saturating_sub(previous_ms));
                }
                tracing::info!(
                    time_ms = event.time_ms,
                    label = %event.label,
                    value = event.value,
                    "replayed event"
                );
            }
            previous_ms = Some(event.time_ms);

            let aggregate = aggregator.push(&event);
            atomic_tx
                .send(event)
                .map_err(|_| PipelineError::Disconnected { stream: "atomic" })?;
            stats.atomic_events += 1;

            if let Some(aggregate) = aggregate {
                aggregate_tx
                    .send(aggregate)
                    .map_err(|_| PipelineError::Disconnected { stream: "aggregate" })?;
                stats.aggregate_events += 1;
            }
        }

        tracing::debug!(
            path = %path.display(),
            atomic_events = stats.atomic_events,
            aggregate_events = stats.aggregate_events,
            "replay finished"
        );
        Ok(stats)
    }
}

/// Sleeps for the recorded gap between two events. Non-positive gaps are skipped.
fn pace(gap_ms: i64) {
    if let Ok(gap_ms) = u64::try_from(gap_ms) {
        if gap_ms > 0 {
            thread::sleep(Duration::from_millis(gap_ms));
        }
    }
}
