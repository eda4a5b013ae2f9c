//! Submission flow
//!
//! Two entry points feed the same commit:
//! - the wizard, which accumulates answers in the `PendingStore` step by
//!   step and writes attachments to disk at the upload step;
//! - the single-page form, which posts everything at once.
//!
//! A commit inserts the submission and its file rows in one transaction and
//! then clears the visitor's pending record. If the transaction fails,
//! single-page uploads written for it are deleted again.

use chrono::Utc;
use intake_core::{
    format_timestamp, is_allowed_file, sanitize_filename, FieldLookup, NewUploadedFile,
    PendingFile, StepOutcome, SubmissionFlow, SubmissionId, SubmissionSource,
    UploadPart, WizardStep, FLOW_FIELD,
};
use intake_storage::FileStore;

use crate::error::{ApiError, ApiResult};
use crate::extractors::FormPayload;
use crate::session::SessionId;
use crate::state::AppState;

// ============================================================================
// WIZARD STEPS
// ============================================================================

/// Merge one step's posted fields (and, at the upload step, files) into the
/// visitor's pending record.
pub async fn record_step(
    state: &AppState,
    session: SessionId,
    step: WizardStep,
    payload: FormPayload,
) -> ApiResult<StepOutcome> {
    let now = Utc::now();

    let uploaded = if step.accepts_files() {
        Some(store_accepted(&state.files, &payload.files).await?)
    } else {
        None
    };

    let modified = state.pending.modify(session, now, |record| {
        record.merge(payload.fields, now);
        match uploaded {
            Some(files) => record.replace_files(files, now),
            None => Vec::new(),
        }
    });

    let mut stale: Vec<String> = modified.value.into_iter().map(|f| f.stored_path).collect();
    if let Some(expired) = modified.displaced {
        stale.extend(expired.stored_paths().map(str::to_owned));
    }
    if !stale.is_empty() {
        state.files.remove_all(&stale).await;
    }

    tracing::debug!(%session, %step, "Recorded wizard step");
    Ok(step.outcome())
}

/// Store the allow-listed parts; everything else is dropped silently.
async fn store_accepted(files: &FileStore, parts: &[UploadPart]) -> ApiResult<Vec<PendingFile>> {
    let mut accepted = Vec::new();
    for part in parts {
        let name = sanitize_filename(&part.filename);
        if is_allowed_file(&name) {
            accepted.push((name, part));
        } else {
            tracing::debug!(filename = %part.filename, "Dropped upload with disallowed extension");
        }
    }
    let stored = store_all(files, accepted).await?;
    Ok(stored.into_iter().map(PendingFile::from).collect())
}

/// Write every accepted part, or none: if one write fails, the files
/// already written for this request are deleted before the error returns.
async fn store_all(
    files: &FileStore,
    accepted: Vec<(String, &UploadPart)>,
) -> ApiResult<Vec<NewUploadedFile>> {
    let mut stored = Vec::new();
    for (name, part) in accepted {
        match files.store(&name, &part.bytes).await {
            Ok(file) => stored.push(file),
            Err(e) => {
                discard(files, &stored).await;
                return Err(e.into());
            }
        }
    }
    Ok(stored)
}

async fn discard(files: &FileStore, stored: &[NewUploadedFile]) {
    let paths: Vec<String> = stored.iter().map(|f| f.stored_path.clone()).collect();
    let removed = files.remove_all(&paths).await;
    tracing::debug!(removed, "Discarded uploads of a failed request");
}

// ============================================================================
// COMMIT
// ============================================================================

/// What a successful commit produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub submission_id: SubmissionId,
    pub flow: SubmissionFlow,
    pub business_name: String,
    pub file_count: usize,
    /// Visitor-facing notes about skipped files (single-page form only).
    pub warnings: Vec<String>,
}

/// Decide the data source of a `/submit` request from its flow marker.
///
/// `route_marker` comes from the URL and overrides any `flow` field in the
/// body. A wizard commit needs a live pending record behind a valid
/// session; there is no fallback to the single-page form.
pub fn resolve_source(
    state: &AppState,
    session: Option<SessionId>,
    route_marker: Option<&str>,
    payload: FormPayload,
) -> ApiResult<SubmissionSource> {
    let marker = route_marker.or_else(|| payload.fields.field(FLOW_FIELD));
    match SubmissionFlow::from_marker(marker)? {
        SubmissionFlow::Wizard => session
            .and_then(|id| state.pending.get_live(&id, Utc::now()))
            .map(SubmissionSource::Wizard)
            .ok_or_else(|| {
                tracing::info!(has_session = session.is_some(), "Wizard commit without pending submission");
                ApiError::no_pending_submission()
            }),
        SubmissionFlow::Direct => Ok(SubmissionSource::Direct(payload.into_direct())),
    }
}

/// Persist a submission and clear the visitor's pending record.
pub async fn commit(
    state: &AppState,
    session: Option<SessionId>,
    source: SubmissionSource,
) -> ApiResult<CommitReceipt> {
    let now = format_timestamp(Utc::now());
    let flow = source.flow();
    let fields = source.fields();

    let mut warnings = Vec::new();
    let files: Vec<NewUploadedFile> = match source {
        SubmissionSource::Wizard(pending) => pending
            .files
            .unwrap_or_default()
            .into_iter()
            .map(NewUploadedFile::from)
            .collect(),
        SubmissionSource::Direct(payload) => {
            let mut accepted = Vec::new();
            for part in &payload.files {
                let name = sanitize_filename(&part.filename);
                if is_allowed_file(&name) {
                    accepted.push((name, part));
                } else {
                    warnings.push(format!(
                        "File \"{}\" is not an allowed type and was skipped.",
                        part.filename
                    ));
                }
            }
            store_all(&state.files, accepted).await?
        }
    };

    let submission_id = match state.repo.create(&fields, &files, &now).await {
        Ok(id) => id,
        Err(e) => {
            // Wizard uploads stay with the pending record for a retry.
            if flow == SubmissionFlow::Direct {
                discard(&state.files, &files).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        submission_id,
        flow = flow.as_str(),
        files = files.len(),
        skipped = warnings.len(),
        "Submission committed"
    );

    if let Some(id) = session {
        clear_pending(state, id, flow).await;
    }

    Ok(CommitReceipt {
        submission_id,
        flow,
        business_name: fields.business_name,
        file_count: files.len(),
        warnings,
    })
}

/// Drop the visitor's pending record after a commit.
///
/// After a wizard commit its files belong to the new submission; after a
/// single-page commit nothing references them any more.
async fn clear_pending(state: &AppState, id: SessionId, flow: SubmissionFlow) {
    let Some(record) = state.pending.remove(&id) else {
        return;
    };
    if flow == SubmissionFlow::Direct {
        let paths: Vec<String> = record.stored_paths().map(str::to_owned).collect();
        let removed = state.files.remove_all(&paths).await;
        if removed > 0 {
            tracing::debug!(session = %id, removed, "Removed abandoned wizard uploads");
        }
    }
}
