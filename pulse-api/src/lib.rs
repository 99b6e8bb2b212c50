//! pulse-api library interface
//!
//! Exposes the router, application state, and subsystems for integration
//! testing.

pub mod api;
pub mod error;
pub mod insights;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::insights::InsightGenerator;
use crate::store::SubmissionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store (backend selected at startup)
    pub store: Arc<dyn SubmissionStore>,
    /// Insight generator (external service with offline fallback)
    pub insights: Arc<InsightGenerator>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn SubmissionStore>, insights: Arc<InsightGenerator>) -> Self {
        Self { store, insights }
    }
}

/// Build application router
///
/// CORS is permissive: the submission form and the dashboard poll this API
/// from browser origins the service does not control.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::submission_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
