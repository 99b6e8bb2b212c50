//! Submission API: create and list feedback submissions
//!
//! POST validates the payload, generates the insight (external service or
//! offline fallback), and appends the finished record to the store. GET is a
//! thin pass-through returning every record newest-first; all aggregation
//! (rating distribution, sentiment filters, pagination) is derived
//! client-side from this one full-collection fetch. Both responses carry
//! `Cache-Control: no-store` - dashboards poll on a short cadence and must
//! see near-real-time state.

use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::{ApiError, ApiResult, AppState};
use pulse_common::Submission;

/// Minimum review length after trimming, in characters
const MIN_REVIEW_CHARS: usize = 10;

const NO_STORE: [(HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store")];

/// Incoming submission payload.
///
/// Both fields are lenient JSON values: validation (not deserialization)
/// decides what is acceptable, so every rejection carries the documented
/// human-readable reason.
#[derive(Debug, Deserialize)]
pub struct SubmissionPayload {
    pub rating: Option<Value>,
    pub review: Option<Value>,
}

/// POST /api/submissions
///
/// Returns the full created record (201) on success. Validation failures
/// are 400 with the specific reason and leave the store untouched; a store
/// write failure after validation is a 500 and discards the generated
/// insight (regeneration on retry is cheap and side-effect-free).
pub async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<SubmissionPayload>,
) -> ApiResult<impl IntoResponse> {
    let rating = coerce_rating(payload.rating.as_ref())
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| ApiError::BadRequest("Rating must be between 1 and 5.".to_string()))?;

    let review = payload
        .review
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    if review.chars().count() < MIN_REVIEW_CHARS {
        return Err(ApiError::BadRequest(
            "Review must be at least 10 characters long.".to_string(),
        ));
    }

    let insight = state.insights.generate(rating, &review).await;
    let submission = Submission::new(rating, review, insight);

    if let Err(e) = state.store.append(submission.clone()).await {
        error!(id = %submission.id, "Failed to store submission: {}", e);
        return Err(ApiError::Storage(e));
    }

    info!(id = %submission.id, rating, "Stored feedback submission");
    Ok((StatusCode::CREATED, NO_STORE, Json(submission)))
}

/// GET /api/submissions
///
/// The full ordered collection, newest-first. Never fails: store read
/// problems degrade to an empty list inside the store.
pub async fn list_submissions(State(state): State<AppState>) -> impl IntoResponse {
    let submissions = state.store.list_all().await;
    (NO_STORE, Json(submissions))
}

/// Coerce a JSON value to an integral rating.
///
/// Accepts integers, integral floats, and numeric strings (the submission
/// form posts whatever its input element holds). Fractional or non-numeric
/// values do not coerce.
fn coerce_rating(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Build submission routes
pub fn submission_routes() -> Router<AppState> {
    Router::new().route(
        "/api/submissions",
        get(list_submissions).post(create_submission),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_rating_accepts_integers() {
        assert_eq!(coerce_rating(Some(&json!(4))), Some(4));
        assert_eq!(coerce_rating(Some(&json!(1))), Some(1));
    }

    #[test]
    fn test_coerce_rating_accepts_integral_floats() {
        assert_eq!(coerce_rating(Some(&json!(5.0))), Some(5));
    }

    #[test]
    fn test_coerce_rating_accepts_numeric_strings() {
        assert_eq!(coerce_rating(Some(&json!("3"))), Some(3));
        assert_eq!(coerce_rating(Some(&json!(" 2 "))), Some(2));
    }

    #[test]
    fn test_coerce_rating_rejects_fractions() {
        assert_eq!(coerce_rating(Some(&json!(3.5))), None);
    }

    #[test]
    fn test_coerce_rating_rejects_non_numeric() {
        assert_eq!(coerce_rating(Some(&json!("five"))), None);
        assert_eq!(coerce_rating(Some(&json!(true))), None);
        assert_eq!(coerce_rating(Some(&json!(null))), None);
        assert_eq!(coerce_rating(None), None);
    }
}
