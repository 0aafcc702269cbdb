//! Pipeline orchestration
//!
//! Wires one producer ([`ReplayEngine`]) to two independent consumers
//! ([`RawLogger`] and [`EventCollector`]) over bounded channels:
//!
//! ```text
//!                 atomic   ┌───────────┐
//!              ┌─────────▶ │ RawLogger │ ──▶ temp file
//! ┌──────────┐ │           └───────────┘
//! │  Replay  │─┤
//! └──────────┘ │ aggregate ┌────────────────┐
//!              └─────────▶ │ EventCollector │ ──▶ Activity
//!                          └────────────────┘
//! ```
//!
//! Consumers run on scoped threads and finish when their stream closes. The
//! replay runs on the calling thread, so [`run_pipeline`] returns only after
//! the input is exhausted and both consumers have been joined.

use std::thread;

use crossbeam_channel::bounded;

use crate::activity::Activity;
use crate::collector::EventCollector;
use crate::error::PipelineError;
use crate::logger::RawLogger;
use crate::replay::{ReplayEngine, ReplayStats};

/// Backpressure bound for each stream.
const CHANNEL_CAPACITY: usize = 256;

/// Everything observed during one successful pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The collected activity, `None` if no aggregate events were produced.
    pub activity: Option<Activity>,
    /// Events the raw logger wrote to its file.
    pub logged_events: u64,
    pub stats: ReplayStats,
}

/// Runs one replay through the logger and collector.
///
/// A raw logger failure takes precedence over the producer's error, since the
/// producer only sees it as a disconnected stream.
pub fn run_pipeline(
    engine: ReplayEngine,
    logger: RawLogger,
) -> Result<PipelineOutput, PipelineError> {
    let (atomic_tx, atomic_rx) = bounded(CHANNEL_CAPACITY);
    let (aggregate_tx, aggregate_rx) = bounded(CHANNEL_CAPACITY);

    let (replayed, logged, collected) = thread::scope(|scope| {
        let collector_handle = scope.spawn(move || EventCollector::new().run(aggregate_rx));
        let logger_handle = scope.spawn(move || logger.run(atomic_rx));

        let replayed = engine.run(atomic_tx, aggregate_tx);

        let logged = logger_handle
            .join()
            .map_err(|_| PipelineError::ConsumerPanicked {
                consumer: "raw logger",
            })
            .and_then(|result| result);
        let collected = collector_handle
            .join()
            .map_err(|_| PipelineError::ConsumerPanicked {
                consumer: "event collector",
            });
        (replayed, logged, collected)
    });

    let logged_events = logged?;
    let stats = replayed?;
    let activity = collected?.activity();
    check_event_counts(logged_events, stats.atomic_events)?;

    Ok(PipelineOutput {
        activity,
        logged_events,
        stats,
    })
}

/// The raw log must hold exactly the events that were replayed.
fn check_event_counts(logged: u64, replayed: u64) -> Result<(), PipelineError> {
    if logged == replayed {
        Ok(())
    } else {
        Err(PipelineError::EventCountMismatch { logged, replayed })
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::event::AtomicEvent;

    fn write_log(dir: &Path, lines: &[String]) -> PathBuf {
        let path = dir.join("input.log");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    fn workout_lines(meters: u64) -> Vec<String> {
        let mut lines = Vec::new();
        for m in 1..=meters {
            let time_ms = 1_700_000_000_000 + i64::try_from(m).unwrap() * 400;
            lines.push(format!(
                r#"{{"time_ms":{},"label":"watts","value":{}}}"#,
                time_ms - 200,
                100 + m
            ));
            lines.push(format!(
                r#"{{"time_ms":{time_ms},"label":"total_distance_m","value":{m}}}"#
            ));
        }
        lines
    }

    #[test]
    fn logger_and_collector_observe_the_same_run() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_log(temp.path(), &workout_lines(600));
        let raw = temp.path().join("raw");

        let engine = ReplayEngine::open(&input, false).unwrap();
        let logger = RawLogger::create(&raw).unwrap();
        let output = run_pipeline(engine, logger).unwrap();

        assert_eq!(output.stats.atomic_events, 1200);
        assert_eq!(output.logged_events, 1200);
        assert_eq!(output.stats.aggregate_events, 600);

        let activity = output.activity.unwrap();
        assert_eq!(activity.samples.len(), 600);
        assert_eq!(activity.start_time_ms, 1_700_000_000_400);

        let logged: Vec<AtomicEvent> = std::fs::read_to_string(&raw)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let distances: Vec<u64> = logged
            .iter()
            .filter(|e| e.label == "total_distance_m")
            .map(|e| e.value)
            .collect();
        assert_eq!(distances, (1..=600).collect::<Vec<_>>());
    }

    #[test]
    fn no_aggregates_yields_no_activity() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_log(
            temp.path(),
            &[r#"{"time_ms":1,"label":"heart_rate","value":99}"#.to_string()],
        );
        let raw = temp.path().join("raw");

        let output = run_pipeline(
            ReplayEngine::open(&input, false).unwrap(),
            RawLogger::create(&raw).unwrap(),
        )
        .unwrap();

        assert!(output.activity.is_none());
        assert_eq!(output.logged_events, 1);
    }

    #[test]
    fn decode_error_keeps_events_logged_before_it() {
        let temp = tempfile::tempdir().unwrap();
        let mut lines = workout_lines(3);
        lines.insert(4, "{\"time_ms\":".to_string());
        let input = write_log(temp.path(), &lines);
        let raw = temp.path().join("raw");

        let err = run_pipeline(
            ReplayEngine::open(&input, false).unwrap(),
            RawLogger::create(&raw).unwrap(),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Decode { line: 5, .. }));
        let expected: String = lines[..4].iter().map(|l| format!("{l}\n")).collect();
        assert_eq!(std::fs::read_to_string(&raw).unwrap(), expected);
    }

    #[test]
    fn raw_log_failure_takes_precedence_over_disconnect() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_log(temp.path(), &workout_lines(2_500));
        let raw = temp.path().join("raw");
        std::fs::write(&raw, "").unwrap();
        let read_only = File::open(&raw).unwrap();

        let err = run_pipeline(
            ReplayEngine::open(&input, false).unwrap(),
            RawLogger::from_file(&raw, read_only),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Io { path: ref p, .. } if *p == raw));
    }

    #[test]
    fn event_count_mismatch_is_an_error() {
        assert!(check_event_counts(12, 12).is_ok());
        assert!(matches!(
            check_event_counts(11, 12),
            Err(PipelineError::EventCountMismatch {
                logged: 11,
                replayed: 12
            })
        ));
    }
}
