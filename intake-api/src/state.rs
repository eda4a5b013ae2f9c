//! Shared application state for Axum routers.

use std::time::Instant;

use intake_storage::{FileStore, SubmissionRepository};

use crate::auth::AdminCredentials;
use crate::config::IntakeConfig;
use crate::error::ApiResult;
use crate::session::{PendingStore, SessionSigner};

/// Application-wide state shared across all routes.
///
/// Built once in `main` (or a test harness) and handed to handlers through
/// axum `State`; nothing here is global.
#[derive(Clone)]
pub struct AppState {
    /// Submission repository over the SQLite pool.
    pub repo: SubmissionRepository,
    /// Upload directory.
    pub files: FileStore,
    /// Wizard answers awaiting commit.
    pub pending: PendingStore,
    pub signer: SessionSigner,
    pub admin: AdminCredentials,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &IntakeConfig, repo: SubmissionRepository) -> Self {
        Self {
            repo,
            files: FileStore::new(config.upload_dir.clone()),
            pending: PendingStore::new(config.pending_ttl),
            signer: SessionSigner::new(config.session_secret.clone(), config.pending_ttl),
            admin: config.admin.clone(),
            start_time: Instant::now(),
        }
    }

    /// Connect the database, bootstrap the schema and create the upload directory.
    pub async fn bootstrap(config: &IntakeConfig) -> ApiResult<Self> {
        let repo = SubmissionRepository::connect(&config.database).await?;
        let state = Self::new(config, repo);
        state.files.ensure_root().await?;

        tracing::info!(
            upload_dir = %config.upload_dir.display(),
            database = %config.database.path.display(),
            "Application state ready"
        );
        Ok(state)
    }
}

crate::impl_from_ref!(SubmissionRepository, repo);
crate::impl_from_ref!(FileStore, files);
crate::impl_from_ref!(PendingStore, pending);
crate::impl_from_ref!(SessionSigner, signer);
crate::impl_from_ref!(AdminCredentials, admin);
crate::impl_from_ref!(Instant, start_time);
