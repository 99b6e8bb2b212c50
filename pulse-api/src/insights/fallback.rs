//! Deterministic offline insight generation
//!
//! The safety net behind the external generation call: pure string
//! formatting over already-validated inputs, so ingestion always completes
//! even with the external dependency fully down.

use pulse_common::{Insight, Sentiment};

/// Review excerpt length used in fallback summaries (characters)
const SUMMARY_EXCERPT_CHARS: usize = 120;

/// Fixed action list returned by every fallback insight
const FALLBACK_ACTIONS: [&str; 3] = [
    "Thank the user for their detailed feedback",
    "Share the insights with the product team",
    "Reach out with a personalised follow-up if contact info is available",
];

/// Build the deterministic insight for a validated rating and review
pub fn fallback_insight(rating: i64, review: &str) -> Insight {
    let sentiment = Sentiment::from_rating(rating);

    let mut excerpt: String = review.chars().take(SUMMARY_EXCERPT_CHARS).collect();
    if review.chars().count() > SUMMARY_EXCERPT_CHARS {
        excerpt.push('…');
    }

    Insight {
        ai_response: format!(
            "Thanks for leaving a {}-star review! We appreciate your {} notes and your input will reach the right team immediately.",
            rating,
            sentiment.tone()
        ),
        summary: format!(
            "A {} customer experience where the main message was: \"{}\"",
            sentiment.label(),
            excerpt
        ),
        actions: FALLBACK_ACTIONS.iter().map(|s| s.to_string()).collect(),
    }
}
