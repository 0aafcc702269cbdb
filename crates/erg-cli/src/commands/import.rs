//! Import command: replay a raw log, save its activity, archive the log.
//!
//! The raw log is first rewritten to a uniquely named file in the temp folder
//! while the activity is collected. The archive copy is only created after the
//! activity has been committed to the database, so an archived log always has
//! a database row. Every failure before the commit leaves the temp file where
//! it is and returns no activity; a failure to archive after the commit is
//! fatal, because the database and the archive no longer agree.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use erg_core::{Activity, PipelineError, RawLogger, ReplayEngine, run_pipeline};
use erg_db::{Database, DbError};

use super::util::millis_to_zulu;
use crate::Config;

/// Random bytes per temp file name; encodes to 43 URL-safe characters.
const ID_BYTES: usize = 32;

const OPENING_SOURCE: &str = "opening source";
const CREATING_DESTINATION: &str = "creating destination";
const COPYING: &str = "copying";
/// The only stage reached after the destination holds a complete copy.
const REMOVING_SOURCE: &str = "removing source";

/// Reasons an import can fail.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to generate a temp file name: {0}")]
    Entropy(String),

    #[error("failed to create {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("replay failed, raw log kept at {}: {source}", temp_path.display())]
    Replay {
        temp_path: PathBuf,
        #[source]
        source: PipelineError,
    },

    #[error(
        "empty or incorrect activity for log file {}, raw log kept at {}",
        input.display(),
        temp_path.display()
    )]
    EmptyResult { input: PathBuf, temp_path: PathBuf },

    #[error("activity start time {start_time_ms} cannot name an archive file")]
    InvalidStartTime { start_time_ms: i64 },

    #[error("failed to save activity, raw log kept at {}: {source}", temp_path.display())]
    Persistence {
        temp_path: PathBuf,
        #[source]
        source: DbError,
    },

    #[error(
        "activity {start_time_ms} was saved but its raw log could not be archived ({source}); {}",
        source.advice(temp_path, archive_path)
    )]
    Relocation {
        start_time_ms: i64,
        temp_path: PathBuf,
        archive_path: PathBuf,
        #[source]
        source: MoveError,
    },
}

impl ImportError {
    /// Whether the failure left the database and the archive inconsistent.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Relocation { .. })
    }
}

/// A copy-then-delete move that failed at `stage`.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct MoveError {
    stage: &'static str,
    #[source]
    source: io::Error,
}

impl MoveError {
    fn at(stage: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self { stage, source }
    }

    /// What an operator has to do by hand to finish the move.
    fn advice(&self, from: &Path, to: &Path) -> String {
        if self.stage == REMOVING_SOURCE {
            format!(
                "{} is complete, remove {} manually",
                to.display(),
                from.display()
            )
        } else {
            format!("move {} to {} manually", from.display(), to.display())
        }
    }
}

/// Runs the import command.
pub fn run(config: &Config, input: Option<&Path>, replay: bool) -> Result<Option<Activity>> {
    let Some(input) = input else {
        tracing::error!("nothing to import");
        return Ok(None);
    };
    import_activity(config, input, replay)
}

/// Imports one raw log.
///
/// Returns `Ok(None)` when the import failed but can be retried; the reason is
/// logged. Returns `Err` only when the activity was committed but its raw log
/// could not be archived.
pub fn import_activity(config: &Config, input: &Path, replay: bool) -> Result<Option<Activity>> {
    tracing::info!(input = %input.display(), replay, "importing activity");
    settle(try_import(config, input, replay))
}

/// Splits import failures into retryable ones, logged and reported as no
/// activity, and fatal ones, returned as errors.
fn settle(result: Result<Activity, ImportError>) -> Result<Option<Activity>> {
    match result {
        Ok(activity) => Ok(Some(activity)),
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(err) => {
            tracing::error!(error = %err, "import failed");
            Ok(None)
        }
    }
}

fn try_import(config: &Config, input: &Path, replay: bool) -> Result<Activity, ImportError> {
    let engine = ReplayEngine::open(input, replay)?;

    ensure_dir(&config.temp_folder)?;
    let temp_path = config.temp_folder.join(random_id()?);
    let logger = RawLogger::create(&temp_path)?;
    tracing::debug!(temp_path = %temp_path.display(), "writing raw log");

    record_and_archive(config, input, engine, logger, temp_path)
}

/// Runs the pipeline into `logger`, commits the activity, then archives the
/// raw log written to `temp_path`.
fn record_and_archive(
    config: &Config,
    input: &Path,
    engine: ReplayEngine,
    logger: RawLogger,
    temp_path: PathBuf,
) -> Result<Activity, ImportError> {
    let output = run_pipeline(engine, logger).map_err(|source| ImportError::Replay {
        temp_path: temp_path.clone(),
        source,
    })?;
    let Some(activity) = output.activity else {
        return Err(ImportError::EmptyResult {
            input: input.to_path_buf(),
            temp_path,
        });
    };
    tracing::info!(
        start_time_ms = activity.start_time_ms,
        samples = activity.samples.len(),
        raw_events = output.logged_events,
        "parsed activity"
    );

    // Everything the archive step needs is checked before the commit.
    let start_time_ms = activity.start_time_ms;
    let archive_name = millis_to_zulu(start_time_ms)
        .map_err(|_| ImportError::InvalidStartTime { start_time_ms })?;
    ensure_dir(&config.workout_folder)?;
    if let Some(parent) = config.database_path.parent() {
        ensure_dir(parent)?;
    }
    let archive_path = config.workout_folder.join(format!("{archive_name}.log"));

    save_activity(&config.database_path, &activity).map_err(|source| {
        ImportError::Persistence {
            temp_path: temp_path.clone(),
            source,
        }
    })?;
    tracing::info!(start_time_ms, "activity saved to database");

    move_file(&temp_path, &archive_path).map_err(|source| ImportError::Relocation {
        start_time_ms,
        temp_path: temp_path.clone(),
        archive_path: archive_path.clone(),
        source,
    })?;
    tracing::info!(path = %archive_path.display(), "activity log saved");

    Ok(activity)
}

/// Commits the activity; the connection is closed when this returns.
fn save_activity(database_path: &Path, activity: &Activity) -> Result<i64, DbError> {
    let mut db = Database::open(database_path)?;
    db.insert_activity(activity)
}

fn ensure_dir(path: &Path) -> Result<(), ImportError> {
    fs::create_dir_all(path).map_err(|source| ImportError::Setup {
        path: path.to_path_buf(),
        source,
    })
}

/// Generates a URL-safe temp file name from the OS random source.
///
/// There is no fallback: if the OS cannot supply randomness the import fails
/// rather than risk two imports sharing a temp file.
pub fn random_id() -> Result<String, ImportError> {
    let mut bytes = [0_u8; ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ImportError::Entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Moves a file by copying it to a newly created destination, then deleting
/// the source.
///
/// The source is only removed once the copy is complete and synced. A partial
/// destination is removed again so the archive never holds a truncated log.
pub fn move_file(from: &Path, to: &Path) -> Result<(), MoveError> {
    let mut source = File::open(from).map_err(MoveError::at(OPENING_SOURCE))?;
    let mut dest = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .map_err(MoveError::at(CREATING_DESTINATION))?;

    let copied = io::copy(&mut source, &mut dest).and_then(|_| dest.sync_all());
    drop(dest);
    drop(source);
    if let Err(err) = copied {
        if let Err(cleanup) = fs::remove_file(to) {
            tracing::warn!(
                path = %to.display(),
                error = %cleanup,
                "failed to remove partial copy"
            );
        }
        return Err(MoveError::at(COPYING)(err));
    }

    fs::remove_file(from).map_err(MoveError::at(REMOVING_SOURCE))
}
