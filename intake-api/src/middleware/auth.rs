//! Admin authentication middleware

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::AdminCredentials;
use crate::error::ApiError;

/// Reject requests without valid admin Basic credentials.
///
/// ```ignore
/// let admin = Router::new()
///     .route("/admin", get(list))
///     .layer(middleware::from_fn_with_state(credentials, admin_auth_middleware));
/// ```
pub async fn admin_auth_middleware(
    State(credentials): State<AdminCredentials>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    credentials.authenticate(auth_header)?;
    Ok(next.run(request).await)
}
