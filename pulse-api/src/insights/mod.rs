//! Insight generation for feedback submissions
//!
//! One call per submission to an OpenAI-compatible chat-completions endpoint
//! with a strict response schema, degrading to a deterministic offline
//! fallback whenever the service is unconfigured or the call fails. The
//! generator itself never fails: every submission gets a structurally valid
//! insight.

pub mod client;
pub mod fallback;

pub use client::{GenerationError, InsightClient};
pub use fallback::fallback_insight;

use pulse_common::config::InsightsConfig;
use pulse_common::Insight;
use tracing::{info, warn};

/// Insight generator: external client when configured, fallback otherwise
pub struct InsightGenerator {
    client: Option<InsightClient>,
}

impl InsightGenerator {
    /// Build from configuration. An absent API key is a supported
    /// configuration and selects offline-fallback generation.
    pub fn new(config: &InsightsConfig) -> Self {
        let client = match &config.api_key {
            Some(api_key) => match InsightClient::new(api_key.clone(), config) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("Insight client unavailable: {} (using offline fallback)", e);
                    None
                }
            },
            None => {
                info!("No insight API key configured; using offline fallback generation");
                None
            }
        };

        Self { client }
    }

    /// Generate the insight for a validated submission. Always succeeds:
    /// any failure of the external call is absorbed by the fallback within
    /// this one invocation (a substitution, not a retry).
    pub async fn generate(&self, rating: i64, review: &str) -> Insight {
        let Some(client) = &self.client else {
            return fallback_insight(rating, review);
        };

        match client.generate(rating, review).await {
            Ok(insight) => insight,
            Err(e) => {
                warn!("Insight generation degraded: {} (using offline fallback)", e);
                fallback_insight(rating, review)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> InsightsConfig {
        InsightsConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 15,
        }
    }

    #[tokio::test]
    async fn test_unconfigured_generator_uses_fallback() {
        let generator = InsightGenerator::new(&offline_config());
        let insight = generator.generate(5, "Great service, loved it!").await;

        assert!(!insight.ai_response.is_empty());
        assert!(!insight.summary.is_empty());
        assert_eq!(insight.actions.len(), 3);
        assert!(insight.ai_response.contains("5-star"));
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_fallback() {
        // A configured client pointed at a closed port fails fast and must
        // fall back rather than surface an error.
        let config = InsightsConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 1,
        };
        let generator = InsightGenerator::new(&config);
        let insight = generator.generate(2, "Not happy with the wait time").await;

        assert!(insight.ai_response.contains("2-star"));
        assert!(insight.summary.contains("negative"));
        assert_eq!(insight.actions.len(), 3);
    }
}
