//! Service Configuration
//!
//! Settings are loaded from environment variables with development defaults.
//! Secrets are held as `SecretString` and never printed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use intake_storage::DbConfig;
use secrecy::{ExposeSecret, SecretString};

use crate::auth::AdminCredentials;
use crate::constants::{
    DEFAULT_ADMIN_PASS, DEFAULT_ADMIN_USER, DEFAULT_BIND_HOST, DEFAULT_DATABASE_PATH,
    DEFAULT_MAX_UPLOAD_MB, DEFAULT_PENDING_TTL_SECS, DEFAULT_PORT, DEFAULT_SESSION_SECRET,
    DEFAULT_UPLOAD_DIR,
};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Deployment environment, from `INTAKE_ENVIRONMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Everything the server needs at startup.
#[derive(Clone)]
pub struct IntakeConfig {
    /// Host to bind
    pub bind_host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory receiving uploaded files
    pub upload_dir: PathBuf,

    /// SQLite settings
    pub database: DbConfig,

    /// Admin basic-auth credentials
    pub admin: AdminCredentials,

    /// Key for signing session tokens
    pub session_secret: SecretString,

    /// Request body limit in bytes
    pub max_upload_bytes: usize,

    /// Idle lifetime of a pending submission
    pub pending_ttl: Duration,

    pub environment: Environment,
}

impl std::fmt::Debug for IntakeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeConfig")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("database", &self.database)
            .field("admin", &self.admin)
            .field("session_secret", &"[REDACTED]")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("pending_ttl", &self.pending_ttl)
            .field("environment", &self.environment)
            .finish()
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            database: DbConfig::at(DEFAULT_DATABASE_PATH),
            admin: AdminCredentials::new(DEFAULT_ADMIN_USER, DEFAULT_ADMIN_PASS),
            session_secret: SecretString::from(DEFAULT_SESSION_SECRET.to_string()),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            pending_ttl: Duration::from_secs(DEFAULT_PENDING_TTL_SECS),
            environment: Environment::Development,
        }
    }
}

impl IntakeConfig {
    /// Create IntakeConfig from environment variables.
    ///
    /// Environment variables:
    /// - `INTAKE_BIND`: host to bind (default: 0.0.0.0)
    /// - `PORT` or `INTAKE_PORT`: listen port (default: 8000)
    /// - `INTAKE_UPLOAD_DIR`: upload directory (default: uploads)
    /// - `INTAKE_DATABASE`, `INTAKE_DB_POOL_SIZE`: see `DbConfig::from_env`
    /// - `INTAKE_ADMIN_USER` / `INTAKE_ADMIN_PASS`: admin credentials (default: admin / changeme)
    /// - `INTAKE_SESSION_SECRET`: session signing key
    /// - `INTAKE_MAX_UPLOAD_MB`: request body limit in MB (default: 50)
    /// - `INTAKE_PENDING_TTL_SECS`: pending submission idle lifetime (default: 86400)
    /// - `INTAKE_ENVIRONMENT`: "production" enables strict secret checks
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("INTAKE_PORT").ok())
        {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", value)))?,
            None => defaults.port,
        };

        let admin_user =
            std::env::var("INTAKE_ADMIN_USER").unwrap_or_else(|_| DEFAULT_ADMIN_USER.to_string());
        let admin_pass =
            std::env::var("INTAKE_ADMIN_PASS").unwrap_or_else(|_| DEFAULT_ADMIN_PASS.to_string());

        let max_upload_mb = std::env::var("INTAKE_MAX_UPLOAD_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|mb| *mb > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        let pending_ttl = Duration::from_secs(
            std::env::var("INTAKE_PENDING_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PENDING_TTL_SECS),
        );

        Ok(Self {
            bind_host: std::env::var("INTAKE_BIND").unwrap_or(defaults.bind_host),
            port,
            upload_dir: std::env::var("INTAKE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            database: DbConfig::from_env(),
            admin: AdminCredentials::new(admin_user, admin_pass),
            session_secret: std::env::var("INTAKE_SESSION_SECRET")
                .map(SecretString::from)
                .unwrap_or(defaults.session_secret),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            pending_ttl,
            environment: std::env::var("INTAKE_ENVIRONMENT")
                .map(|s| Environment::parse(&s))
                .unwrap_or_default(),
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    pub fn uses_default_session_secret(&self) -> bool {
        self.session_secret.expose_secret() == DEFAULT_SESSION_SECRET
    }

    /// Refuse default secrets in production; warn about them otherwise.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let is_production = self.environment.is_production();

        if self.admin.uses_default_password() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start in production with the default admin password. \
                     Set INTAKE_ADMIN_PASS. INTAKE_ENVIRONMENT={}",
                    self.environment.as_str()
                )));
            }
            tracing::warn!(
                "SECURITY WARNING: using the default admin password. \
                 Set INTAKE_ADMIN_PASS before deploying."
            );
        }

        if self.uses_default_session_secret() {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "Cannot start in production with the default session secret. \
                     Set INTAKE_SESSION_SECRET. INTAKE_ENVIRONMENT={}",
                    self.environment.as_str()
                )));
            }
            tracing::warn!(
                "SECURITY WARNING: using the default session secret. \
                 Set INTAKE_SESSION_SECRET before deploying."
            );
        }

        Ok(())
    }
}
