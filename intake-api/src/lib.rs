//! Intake API - HTML onboarding service
//!
//! Serves the eight-step onboarding wizard, the single-page direct form,
//! the shared commit endpoint and a Basic-auth protected admin listing.
//! Answers are persisted to SQLite through `intake-storage`; uploads land
//! in a flat directory on disk.

#[macro_use]
mod macros;

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractors;
pub mod flow;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod views;

// Re-export commonly used types
pub use auth::{basic_auth_header, parse_basic_auth, AdminCredentials};
pub use config::{Environment, IntakeConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extractors::FormPayload;
pub use flow::CommitReceipt;
pub use jobs::{pending_sweep_task, PendingSweepConfig, PendingSweepMetrics};
pub use routes::create_api_router;
pub use session::{PendingStore, SessionId, SessionSigner};
pub use state::AppState;
