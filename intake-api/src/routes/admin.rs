//! Admin pages
//!
//! Read-only views behind Basic authentication:
//! - GET /admin                    every submission, newest first, with file counts
//! - GET /admin/submissions/{id}   one submission with its files

use axum::{
    extract::{Path, State},
    middleware,
    response::Html,
    routing::get,
    Router,
};
use intake_core::SubmissionId;
use intake_storage::SubmissionRepository;

use crate::auth::AdminCredentials;
use crate::error::{ApiError, ApiResult};
use crate::middleware::admin_auth_middleware;
use crate::state::AppState;
use crate::views;

pub async fn list_submissions(
    State(repo): State<SubmissionRepository>,
) -> ApiResult<Html<String>> {
    let rows = repo.list_with_file_counts().await?;
    tracing::debug!(count = rows.len(), "Rendering admin listing");
    Ok(views::admin_list(&rows))
}

pub async fn show_submission(
    State(repo): State<SubmissionRepository>,
    Path(id): Path<String>,
) -> ApiResult<Html<String>> {
    let id: SubmissionId = id
        .parse()
        .map_err(|_| ApiError::submission_not_found(&id))?;

    let detail = repo
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::submission_not_found(id))?;

    Ok(views::admin_detail(&detail))
}

pub fn create_router(credentials: AdminCredentials) -> Router<AppState> {
    Router::new()
        .route("/admin", get(list_submissions))
        .route("/admin/submissions/:id", get(show_submission))
        .route_layer(middleware::from_fn_with_state(
            credentials,
            admin_auth_middleware,
        ))
}
