//! List command for showing imported activities.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use erg_db::{ActivityRecord, Database};

use super::util::format_duration;
use crate::Config;

/// Activity data for display.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub start_time: String,
    pub start_time_ms: i64,
    pub duration_ms: i64,
    pub distance_m: i64,
    pub calories: i64,
    pub samples: i64,
}

impl From<ActivityRecord> for ActivityEntry {
    fn from(record: ActivityRecord) -> Self {
        Self {
            start_time: record.start_time,
            start_time_ms: record.start_time_ms,
            duration_ms: record.duration_ms,
            distance_m: record.distance_m,
            calories: record.calories,
            samples: record.sample_count,
        }
    }
}

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let entries: Vec<ActivityEntry> = db
        .list_activities()?
        .into_iter()
        .map(ActivityEntry::from)
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *writer, &entries)?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer, "Imported activities")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    if entries.is_empty() {
        writeln!(writer, "No activities imported.")?;
        return Ok(());
    }

    for entry in entries {
        writeln!(
            writer,
            "- {}  {:>8}  {:>6} m  {:>4} kcal  {} samples",
            entry.start_time,
            format_duration(entry.duration_ms),
            entry.distance_m,
            entry.calories,
            entry.samples
        )?;
    }

    Ok(())
}
