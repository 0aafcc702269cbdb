//! Core pipeline for importing rowing monitor logs.
//!
//! This crate contains the fundamental types and logic for:
//! - Replay: reading a raw log and publishing its atomic events, optionally paced
//! - Aggregation: folding atomic events into per-meter aggregate samples
//! - Collection: building an [`Activity`] from aggregate samples
//! - Raw logging: writing the atomic event stream back to a durable file

pub mod activity;
pub mod aggregator;
pub mod collector;
pub mod error;
pub mod event;
pub mod logger;
pub mod metric;
pub mod pipeline;
pub mod replay;

pub use activity::{Activity, Sample};
pub use aggregator::Aggregator;
pub use collector::EventCollector;
pub use error::PipelineError;
pub use event::{AggregateEvent, AtomicEvent};
pub use logger::RawLogger;
pub use metric::{Metric, UnknownMetric};
pub use pipeline::{PipelineOutput, run_pipeline};
pub use replay::{ReplayEngine, ReplayStats};
