//! Audit recorder contract and the newline-delimited JSON journal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::AuditResult;
use crate::event::AuditEvent;

/// Append-only sink for audit events.
///
/// The governance core only ever appends; it never reads its own events back.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Appends a single event.
    async fn append(&self, event: AuditEvent) -> AuditResult<()>;
}

/// Appends `event`, logging failures at `warn` instead of propagating them.
pub async fn append_best_effort(recorder: &dyn AuditRecorder, event: AuditEvent) {
    let record_id = event.record_id();
    let event_type = event.event_type();
    if let Err(err) = recorder.append(event).await {
        warn!(?err, record_id = %record_id, event = %event_type, "audit write failed");
    }
}

/// File-backed recorder writing one JSON event per line.
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl FileJournal {
    /// Opens (or creates) a journal file at the provided path.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while preparing the file.
    pub async fn open(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the underlying path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads back the most recent `limit` events, oldest first.
    ///
    /// Intended for operators and tests; the recorder contract itself is
    /// write-only.
    ///
    /// # Errors
    ///
    /// Propagates I/O and deserialization errors.
    pub async fn tail(&self, limit: usize) -> AuditResult<Vec<AuditEvent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let data = fs::read(&self.path).await?;
        let mut events = Vec::new();
        for chunk in data
            .split(|byte| *byte == b'\n')
            .filter(|chunk| !chunk.is_empty())
        {
            events.push(serde_json::from_slice::<AuditEvent>(chunk)?);
        }

        let skip = events.len().saturating_sub(limit);
        Ok(events.into_iter().skip(skip).collect())
    }
}

impl std::fmt::Debug for FileJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileJournal")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuditRecorder for FileJournal {
    async fn append(&self, event: AuditEvent) -> AuditResult<()> {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        let mut guard = self.file.lock().await;
        guard.write_all(&line).await?;
        guard.flush().await?;
        Ok(())
    }
}
