//! # Pulse Common Library
//!
//! Shared code for the Pulse feedback service:
//! - Domain model (submission records, generated insights, sentiment buckets)
//! - Error types
//! - Configuration loading and resolution

pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{Insight, Sentiment, Submission};
