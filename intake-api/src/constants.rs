//! Constants for the intake service
//!
//! Defaults for every environment-driven setting live here so the config
//! loaders and their tests agree on them.

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;

// ============================================================================
// STORAGE
// ============================================================================

/// Default upload directory
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default SQLite database file
pub const DEFAULT_DATABASE_PATH: &str = "submissions.db";

/// Default request body limit in megabytes
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

// ============================================================================
// ADMIN AUTHENTICATION
// ============================================================================

/// Default admin username
pub const DEFAULT_ADMIN_USER: &str = "admin";

/// Default admin password; refused in production
pub const DEFAULT_ADMIN_PASS: &str = "changeme";

/// Realm sent with the Basic challenge
pub const ADMIN_REALM: &str = "Admin";

// ============================================================================
// SESSIONS
// ============================================================================

/// Default session signing secret; refused in production
pub const DEFAULT_SESSION_SECRET: &str = "dev-only-intake-session-secret";

/// Name of the cookie carrying the signed pending-submission token
pub const SESSION_COOKIE_NAME: &str = "intake_session";

/// Commit target of the wizard's final step; the query carries the flow
pub const WIZARD_COMMIT_PATH: &str = "/submit?flow=wizard";

/// Default idle lifetime of a pending submission (24 hours)
pub const DEFAULT_PENDING_TTL_SECS: u64 = 86_400;

// ============================================================================
// PENDING SWEEP
// ============================================================================

/// Default interval between sweeps of expired pending submissions
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Form field carrying uploaded files
pub const FILES_FIELD: &str = "files";
