//! Domain model for feedback submissions
//!
//! A `Submission` is the sole persisted entity: the caller-supplied rating
//! and review plus the generated insight, stamped with identity and creation
//! time at ingestion. Records are immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored, enriched feedback submission.
///
/// Serialized with camelCase keys; dashboard clients consume this shape
/// verbatim, so field names are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Unique identifier, assigned once at ingestion
    pub id: Uuid,
    /// Star rating, 1-5
    pub rating: i64,
    /// Review text, whitespace-trimmed
    pub review: String,
    /// Generated response to the reviewer
    pub ai_response: String,
    /// Generated one-line summary of the review
    pub summary: String,
    /// Generated recommended actions (1-4 items)
    pub actions: Vec<String>,
    /// Creation timestamp; the sole ordering key for retrieval
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Build a complete record from validated input plus a generated insight.
    ///
    /// Identity (UUIDv4) and creation time are assigned here and nowhere else.
    pub fn new(rating: i64, review: String, insight: Insight) -> Self {
        Self {
            id: Uuid::new_v4(),
            rating,
            review,
            ai_response: insight.ai_response,
            summary: insight.summary,
            actions: insight.actions,
            created_at: Utc::now(),
        }
    }
}

/// The generated `{aiResponse, summary, actions}` triple.
///
/// Produced by the insight generator (external service or offline fallback)
/// and folded into a [`Submission`] at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub ai_response: String,
    pub summary: String,
    pub actions: Vec<String>,
}

/// Sentiment bucket derived from the star rating.
///
/// Used for fallback generation tone; dashboards derive the same bucketing
/// client-side for aggregation. Rating 3 is its own bucket, distinct from
/// the >= 4 positive and <= 2 negative buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Mixed,
    Negative,
}

impl Sentiment {
    pub fn from_rating(rating: i64) -> Self {
        if rating >= 4 {
            Sentiment::Positive
        } else if rating == 3 {
            Sentiment::Mixed
        } else {
            Sentiment::Negative
        }
    }

    /// Sentiment label used in generated summaries
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Mixed => "mixed",
            Sentiment::Negative => "negative",
        }
    }

    /// Tone adjective used in generated responses
    pub fn tone(&self) -> &'static str {
        match self {
            Sentiment::Positive => "glowing",
            Sentiment::Mixed => "balanced",
            Sentiment::Negative => "critical",
        }
    }
}
