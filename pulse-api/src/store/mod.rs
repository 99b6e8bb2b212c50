//! Record store for feedback submissions
//!
//! One storage capability, three backends selected at startup by
//! configuration: process-memory, JSON-file snapshot, or SQLite. Callers
//! hold the trait object and never observe which backend is active.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use pulse_common::config::{StorageBackend, StorageConfig};
use pulse_common::{Result, Submission};
use std::sync::Arc;
use tracing::info;

/// Ordered collection of submission records.
///
/// The collection is newest-first: `append` makes its record the new head,
/// and `list_all` returns the records in that order. Each operation is
/// individually atomic; a concurrent reader never observes a partial write
/// or a partially replaced collection.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Backend name for logs and the health endpoint
    fn backend_name(&self) -> &'static str;

    /// Insert one record as the new most-recent entry.
    ///
    /// Fails when the backing medium cannot be written; previously stored
    /// records are never lost.
    async fn append(&self, submission: Submission) -> Result<()>;

    /// Every stored record, newest-first.
    ///
    /// Never fails: a read-path failure is logged and degrades to an empty
    /// list so display surfaces stay renderable.
    async fn list_all(&self) -> Vec<Submission>;

    /// Atomically discard the collection and install `submissions` verbatim,
    /// preserving the caller-supplied order. Bulk-administration use only.
    async fn replace_all(&self, submissions: Vec<Submission>) -> Result<()>;
}

/// Initialize the store backend named by the configuration
pub async fn init_store(config: &StorageConfig) -> Result<Arc<dyn SubmissionStore>> {
    let store: Arc<dyn SubmissionStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => Arc::new(FileStore::new(config.snapshot_path())),
        StorageBackend::Sqlite => Arc::new(SqliteStore::connect(&config.database_path()).await?),
    };

    info!("Record store initialized ({} backend)", store.backend_name());
    Ok(store)
}
