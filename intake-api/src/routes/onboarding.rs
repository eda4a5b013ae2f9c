//! Onboarding wizard routes
//!
//! - GET  /onboarding             redirect to step 1
//! - GET  /onboarding/step-{n}    render a step (read-only)
//! - POST /onboarding/step-{n}    merge the step and move on
//!
//! axum cannot match a partial path segment, so the `step-{n}` segment is
//! captured whole and parsed by `WizardStep::from_segment`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use intake_core::{StepOutcome, WizardStep};
use uuid::Uuid;

use crate::constants::WIZARD_COMMIT_PATH;
use crate::error::ApiResult;
use crate::extractors::FormPayload;
use crate::flow;
use crate::state::AppState;
use crate::views;

/// Redirect the wizard root to its first step.
pub async fn start() -> Redirect {
    Redirect::to(&WizardStep::FIRST.path())
}

/// Render a step. Never creates or touches a pending record.
pub async fn show_step(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Html<String>> {
    let step = WizardStep::from_segment(&segment)?;
    let pending = state
        .signer
        .session_from_headers(&headers)
        .and_then(|id| state.pending.get_live(&id, Utc::now()));

    Ok(views::step_page(step, pending.as_ref()))
}

/// Record a step, then redirect to the next one (303) or hand the final
/// step's request over to `/submit?flow=wizard` with method and body
/// preserved (307). The wizard flow is set here, not by the posted form.
pub async fn submit_step(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    payload: FormPayload,
) -> ApiResult<Response> {
    let step = WizardStep::from_segment(&segment)?;
    let session = state
        .signer
        .session_from_headers(&headers)
        .unwrap_or_else(Uuid::new_v4);

    let redirect = match flow::record_step(&state, session, step, payload).await? {
        StepOutcome::Advance(next) => Redirect::to(&next.path()),
        StepOutcome::Commit => Redirect::temporary(WIZARD_COMMIT_PATH),
    };
    let cookie = state.signer.issue_cookie(session)?;

    Ok(([(header::SET_COOKIE, cookie)], redirect).into_response())
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/onboarding", get(start))
        .route("/onboarding/:step", get(show_step).post(submit_step))
}
