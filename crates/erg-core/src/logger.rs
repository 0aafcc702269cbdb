//! Durable logging of the atomic event stream.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;

use crate::error::PipelineError;
use crate::event::AtomicEvent;

/// Appends every atomic event it receives to a freshly created file.
#[derive(Debug)]
pub struct RawLogger {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RawLogger {
    /// Creates the destination file, failing if it already exists.
    pub fn create(path: &Path) -> Result<Self, PipelineError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| PipelineError::io(path, e))?;
        Ok(Self::from_file(path, file))
    }

    /// Logs to an already opened file; `path` is only used in error reports.
    pub fn from_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        }
    }

    /// Writes events as JSON lines until the stream closes, then syncs the file.
    ///
    /// Returns the number of events written. On a write error the receiver is
    /// dropped, so the producer sees a disconnected stream and stops.
    pub fn run(mut self, events: Receiver<AtomicEvent>) -> Result<u64, PipelineError> {
        let mut written = 0_u64;
        for event in events {
            self.append(&event)?;
            written += 1;
        }
        self.writer
            .flush()
            .map_err(|e| PipelineError::io(&self.path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| PipelineError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), written, "raw log synced");
        Ok(written)
    }

    fn append(&mut self, event: &AtomicEvent) -> Result<(), PipelineError> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| PipelineError::io(&self.path, e.into()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| PipelineError::io(&self.path, e))
    }
}
