//! Middleware for the intake service
//!
//! - `auth`: Basic-auth gate in front of the admin pages

mod auth;

pub use auth::admin_auth_middleware;
