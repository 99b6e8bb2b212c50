//! SQLite store backend
//!
//! One `submissions` table created on startup. The `actions` list is stored
//! as a JSON-encoded text column; timestamps are RFC 3339 text. Listing
//! orders by `created_at` with rowid as the tiebreak so records appended in
//! the same instant still come back in insertion order, newest first.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use pulse_common::{Error, Result, Submission};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use super::SubmissionStore;

const INSERT_SQL: &str = "INSERT INTO submissions \
     (id, rating, review, ai_response, summary, actions, created_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?)";

type SubmissionRow = (String, i64, String, String, String, String, String);

/// Durable store backed by a SQLite database
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        // WAL allows concurrent readers while a write is in flight
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        Self::initialize(pool).await
    }

    /// Create the schema (idempotent) and wrap the pool
    async fn initialize(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY NOT NULL,
                rating INTEGER NOT NULL,
                review TEXT NOT NULL,
                ai_response TEXT NOT NULL,
                summary TEXT NOT NULL,
                actions TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn row_to_submission(row: SubmissionRow) -> Result<Submission> {
        let (id, rating, review, ai_response, summary, actions, created_at) = row;

        let id = Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Invalid submission id '{}': {}", id, e)))?;
        let actions: Vec<String> = serde_json::from_str(&actions)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", created_at, e)))?
            .with_timezone(&Utc);

        Ok(Submission {
            id,
            rating,
            review,
            ai_response,
            summary,
            actions,
            created_at,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            "SELECT id, rating, review, ai_response, summary, actions, created_at \
             FROM submissions ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_submission).collect()
    }
}

#[async_trait]
impl SubmissionStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn append(&self, submission: Submission) -> Result<()> {
        sqlx::query(INSERT_SQL)
            .bind(submission.id.to_string())
            .bind(submission.rating)
            .bind(&submission.review)
            .bind(&submission.ai_response)
            .bind(&submission.summary)
            .bind(serde_json::to_string(&submission.actions)?)
            .bind(
                submission
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Nanos, true),
            )
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Vec<Submission> {
        match self.fetch_all().await {
            Ok(submissions) => submissions,
            Err(e) => {
                warn!("Failed to read submissions table: {} (serving empty list)", e);
                Vec::new()
            }
        }
    }

    async fn replace_all(&self, submissions: Vec<Submission>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM submissions").execute(&mut *tx).await?;

        // Insert oldest-first so rowid order matches recency; listing then
        // reproduces the caller-supplied order even on timestamp ties.
        for submission in submissions.iter().rev() {
            sqlx::query(INSERT_SQL)
                .bind(submission.id.to_string())
                .bind(submission.rating)
                .bind(&submission.review)
                .bind(&submission.ai_response)
                .bind(&submission.summary)
                .bind(serde_json::to_string(&submission.actions)?)
                .bind(
                    submission
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Nanos, true),
                )
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
