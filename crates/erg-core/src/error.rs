//! Errors raised while replaying, logging or collecting a raw log.

use std::path::PathBuf;

use thiserror::Error;

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Opening, reading or writing a file failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A raw record could not be parsed into an atomic event.
    #[error("malformed record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// A consumer stopped receiving before the input was exhausted.
    #[error("{stream} stream consumer disconnected")]
    Disconnected { stream: &'static str },
    /// A consumer thread panicked before reporting its result.
    #[error("{consumer} thread panicked")]
    ConsumerPanicked { consumer: &'static str },
    /// The raw log holds a different number of events than were replayed.
    #[error("raw log has {logged} events but {replayed} were replayed")]
    EventCountMismatch { logged: u64, replayed: u64 },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
