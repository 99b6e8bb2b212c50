//! In-memory store backend
//!
//! A single vector guarded by one mutex, newest record first. Lifetime is
//! the process lifetime: data does not survive a restart. Suitable for
//! ephemeral deployments and tests.

use async_trait::async_trait;
use pulse_common::{Result, Submission};
use tokio::sync::Mutex;

use super::SubmissionStore;

/// Non-durable store backed by process memory
pub struct MemoryStore {
    submissions: Mutex<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, submission: Submission) -> Result<()> {
        let mut submissions = self.submissions.lock().await;
        submissions.insert(0, submission);
        Ok(())
    }

    async fn list_all(&self) -> Vec<Submission> {
        self.submissions.lock().await.clone()
    }

    async fn replace_all(&self, submissions: Vec<Submission>) -> Result<()> {
        let mut guard = self.submissions.lock().await;
        *guard = submissions;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_common::Insight;

    fn submission(review: &str) -> Submission {
        Submission::new(
            4,
            review.to_string(),
            Insight {
                ai_response: "Thanks!".to_string(),
                summary: "ok".to_string(),
                actions: vec!["Follow up".to_string()],
            },
        )
    }

    #[tokio::test]
    async fn test_append_inserts_at_head() {
        let store = MemoryStore::new();
        store.append(submission("first")).await.unwrap();
        store.append(submission("second")).await.unwrap();
        store.append(submission("third")).await.unwrap();

        let all = store.list_all().await;
        let reviews: Vec<&str> = all.iter().map(|s| s.review.as_str()).collect();
        assert_eq!(reviews, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_list_all_is_idempotent() {
        let store = MemoryStore::new();
        store.append(submission("only one")).await.unwrap();

        let first = store.list_all().await;
        let second = store.list_all().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_replace_all_preserves_caller_order() {
        let store = MemoryStore::new();
        store.append(submission("will be discarded")).await.unwrap();

        let replacement = vec![submission("newest"), submission("oldest")];
        store.replace_all(replacement.clone()).await.unwrap();

        assert_eq!(store.list_all().await, replacement);
    }

    #[tokio::test]
    async fn test_empty_store_lists_empty() {
        let store = MemoryStore::new();
        assert!(store.list_all().await.is_empty());
    }
}
