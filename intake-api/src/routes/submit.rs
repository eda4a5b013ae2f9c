//! Commit endpoint
//!
//! POST /submit persists one submission. The `flow` marker decides where the
//! data comes from: `wizard` reads the visitor's pending record, anything
//! else (or nothing) reads the posted form itself. A marker in the query
//! string takes precedence over one in the body.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extractors::FormPayload;
use crate::flow;
use crate::session::SessionSigner;
use crate::state::AppState;
use crate::views;

/// Query parameters accepted by `/submit`.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuery {
    pub flow: Option<String>,
}

pub async fn submit(
    State(state): State<AppState>,
    Query(query): Query<SubmitQuery>,
    headers: HeaderMap,
    payload: FormPayload,
) -> ApiResult<Response> {
    let session = state.signer.session_from_headers(&headers);
    let source = flow::resolve_source(&state, session, query.flow.as_deref(), payload)?;
    let receipt = flow::commit(&state, session, source).await?;

    Ok((
        [(header::SET_COOKIE, SessionSigner::expired_cookie()?)],
        views::confirmation_page(&receipt),
    )
        .into_response())
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/submit", post(submit))
}
