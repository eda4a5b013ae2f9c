//! Static pages

use axum::{response::Html, routing::get, Router};

use crate::state::AppState;
use crate::views;

pub async fn landing() -> Html<String> {
    views::landing_page()
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/", get(landing))
}
