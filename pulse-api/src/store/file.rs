//! File-backed store backend
//!
//! The whole collection lives in one JSON array, newest-first, rewritten in
//! full on every mutation (a snapshot, not an append-only log). Writes land
//! in a temp file in the same directory and are renamed into place, so a
//! concurrent reader sees either the old snapshot or the new one, never a
//! torn write.

use async_trait::async_trait;
use pulse_common::{Error, Result, Submission};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::warn;

use super::SubmissionStore;

/// Durable store backed by a single JSON snapshot file
pub struct FileStore {
    path: PathBuf,
    /// Serializes mutations; reads go straight to the file
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the current snapshot. A missing file is an empty collection.
    fn load(&self) -> Result<Vec<Submission>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the snapshot atomically (temp file + rename)
    fn write_snapshot(&self, submissions: &[Submission]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(submissions)?;
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path).map_err(Error::Io)
    }
}

#[async_trait]
impl SubmissionStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn append(&self, submission: Submission) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut submissions = self.load()?;
        submissions.insert(0, submission);
        self.write_snapshot(&submissions)
    }

    async fn list_all(&self) -> Vec<Submission> {
        match self.load() {
            Ok(submissions) => submissions,
            Err(e) => {
                warn!(
                    "Failed to read submissions snapshot {}: {} (serving empty list)",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn replace_all(&self, submissions: Vec<Submission>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_snapshot(&submissions)
    }
}
