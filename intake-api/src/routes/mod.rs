//! HTTP routes
//!
//! - `pages`: landing page with the single-page form
//! - `onboarding`: the eight-step wizard
//! - `submit`: commit endpoint for both flows
//! - `admin`: Basic-auth protected listing and detail pages
//! - `health`: liveness and readiness probes

pub mod admin;
pub mod health;
pub mod onboarding;
pub mod pages;
pub mod submit;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

use crate::config::IntakeConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Build the full application router.
pub fn create_api_router(state: AppState, config: &IntakeConfig) -> Router {
    Router::new()
        .merge(pages::create_router())
        .merge(onboarding::create_router())
        .merge(submit::create_router())
        .merge(admin::create_router(state.admin.clone()))
        .merge(health::create_router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::page_not_found()
}
