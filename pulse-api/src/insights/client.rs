//! OpenAI-compatible chat-completions client
//!
//! Issues one request per submission, instructing the model to return
//! strictly-validated structured output: exactly the three insight fields,
//! with `actions` bounded to 1-4 items. Anything else the service returns
//! counts as a malformed response and is reported as a generation error for
//! the caller to absorb.

use pulse_common::config::InsightsConfig;
use pulse_common::Insight;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an empathetic customer-success analyst. \
     Only return minified JSON with keys aiResponse, summary, actions (array).";
const TEMPERATURE: f64 = 0.4;
const MAX_ACTIONS: usize = 4;

/// Insight generation errors. Never surfaced to API callers; the generator
/// maps every variant to the offline fallback.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Chat-completions request payload
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: serde_json::Value,
}

/// User payload serialized into the request; field order is the
/// deterministic serialization the prompt relies on.
#[derive(Debug, Serialize)]
struct UserPayload<'a> {
    rating: i64,
    review: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for one OpenAI-compatible chat-completions endpoint
pub struct InsightClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl InsightClient {
    pub fn new(api_key: String, config: &InsightsConfig) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Request an insight for a validated rating and review
    pub async fn generate(&self, rating: i64, review: &str) -> Result<Insight, GenerationError> {
        let user_content = serde_json::to_string(&UserPayload { rating, review })
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            response_format: insight_response_format(),
        };

        debug!(rating, model = %self.model, "Requesting submission insight");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(status.as_u16(), error_text));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let content = chat_response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| {
                GenerationError::MalformedResponse("Missing response content".to_string())
            })?;

        parse_insight(content)
    }
}

/// Strict response schema: exactly the three insight fields, no extras,
/// 1-4 action items.
fn insight_response_format() -> ResponseFormat {
    ResponseFormat {
        kind: "json_schema",
        json_schema: json!({
            "name": "ai_feedback_response",
            "schema": {
                "type": "object",
                "additionalProperties": false,
                "required": ["aiResponse", "summary", "actions"],
                "properties": {
                    "aiResponse": { "type": "string" },
                    "summary": { "type": "string" },
                    "actions": {
                        "type": "array",
                        "minItems": 1,
                        "maxItems": MAX_ACTIONS,
                        "items": { "type": "string" }
                    }
                }
            }
        }),
    }
}

/// Parse and validate the model's content against the insight contract
fn parse_insight(content: &str) -> Result<Insight, GenerationError> {
    let insight: Insight = serde_json::from_str(content)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    if insight.actions.is_empty() || insight.actions.len() > MAX_ACTIONS {
        return Err(GenerationError::MalformedResponse(format!(
            "Expected 1-{} actions, got {}",
            MAX_ACTIONS,
            insight.actions.len()
        )));
    }

    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InsightsConfig {
        InsightsConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "https://api.openai.com/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 15,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = InsightClient::new("sk-test".to_string(), &config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = InsightClient::new("sk-test".to_string(), &config()).unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_user_payload_serializes_deterministically() {
        let content = serde_json::to_string(&UserPayload {
            rating: 4,
            review: "Solid experience",
        })
        .unwrap();
        assert_eq!(content, r#"{"rating":4,"review":"Solid experience"}"#);
    }

    #[test]
    fn test_response_schema_requires_all_insight_fields() {
        let format = insight_response_format();
        assert_eq!(format.kind, "json_schema");

        let schema = &format.json_schema["schema"];
        assert_eq!(schema["additionalProperties"], false);
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["aiResponse", "summary", "actions"]);
        assert_eq!(schema["properties"]["actions"]["minItems"], 1);
        assert_eq!(schema["properties"]["actions"]["maxItems"], 4);
    }

    #[test]
    fn test_parse_insight_accepts_valid_content() {
        let insight = parse_insight(
            r#"{"aiResponse":"Thanks!","summary":"A happy customer","actions":["Follow up"]}"#,
        )
        .unwrap();
        assert_eq!(insight.ai_response, "Thanks!");
        assert_eq!(insight.actions.len(), 1);
    }

    #[test]
    fn test_parse_insight_rejects_invalid_json() {
        let result = parse_insight("not json");
        assert!(matches!(
            result,
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_insight_rejects_missing_fields() {
        let result = parse_insight(r#"{"aiResponse":"Thanks!"}"#);
        assert!(matches!(
            result,
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_insight_rejects_empty_actions() {
        let result =
            parse_insight(r#"{"aiResponse":"Thanks!","summary":"ok","actions":[]}"#);
        assert!(matches!(
            result,
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_insight_rejects_too_many_actions() {
        let result = parse_insight(
            r#"{"aiResponse":"Thanks!","summary":"ok","actions":["a","b","c","d","e"]}"#,
        );
        assert!(matches!(
            result,
            Err(GenerationError::MalformedResponse(_))
        ));
    }
}
