//! Where a submission's data comes from
//!
//! A commit is fed either by the visitor's accumulated wizard answers or by a
//! single self-contained form post. The choice is made once, from the
//! explicit `flow` marker, and carried as a `SubmissionSource` from then on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::fields::{FieldLookup, SubmissionFields, TermsAgreed};
use crate::submission::{NewUploadedFile, Timestamp};

/// Form key carrying the submission flow marker.
pub const FLOW_FIELD: &str = "flow";

/// Tier keys for wizard answers, in priority order.
const WIZARD_TIER_KEYS: &[&str] = &["plan_tier", "tier"];

/// Tier keys for the single-page form.
const DIRECT_TIER_KEYS: &[&str] = &["tier"];

/// Explicit flow marker posted with `/submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFlow {
    Wizard,
    Direct,
}

impl SubmissionFlow {
    /// Interpret the `flow` form value; a missing marker means a direct post.
    pub fn from_marker(value: Option<&str>) -> CoreResult<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("direct") => Ok(SubmissionFlow::Direct),
            Some("wizard") => Ok(SubmissionFlow::Wizard),
            Some(other) => Err(CoreError::UnknownFlow(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionFlow::Wizard => "wizard",
            SubmissionFlow::Direct => "direct",
        }
    }
}

// ============================================================================
// WIZARD STATE
// ============================================================================

/// An attachment already written to disk during the wizard's upload step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
    pub filename: String,
    pub stored_path: String,
}

impl From<PendingFile> for NewUploadedFile {
    fn from(file: PendingFile) -> Self {
        NewUploadedFile {
            filename: file.filename,
            stored_path: file.stored_path,
        }
    }
}

impl From<NewUploadedFile> for PendingFile {
    fn from(file: NewUploadedFile) -> Self {
        PendingFile {
            filename: file.filename,
            stored_path: file.stored_path,
        }
    }
}

/// Wizard answers accumulated for one visitor between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub fields: HashMap<String, String>,
    /// `None` until the upload step has been posted.
    pub files: Option<Vec<PendingFile>>,
    pub created_at: Timestamp,
    pub last_touched: Timestamp,
}

impl PendingSubmission {
    pub fn new(now: Timestamp) -> Self {
        Self {
            fields: HashMap::new(),
            files: None,
            created_at: now,
            last_touched: now,
        }
    }

    /// Merge posted pairs; later pairs overwrite earlier ones.
    ///
    /// The flow marker is routing metadata and is never stored as an answer.
    pub fn merge<I>(&mut self, pairs: I, now: Timestamp)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in pairs {
            if key == FLOW_FIELD {
                continue;
            }
            self.fields.insert(key, value);
        }
        self.last_touched = now;
    }

    /// Replace the buffered file list, returning the list it replaced.
    pub fn replace_files(&mut self, files: Vec<PendingFile>, now: Timestamp) -> Vec<PendingFile> {
        self.last_touched = now;
        self.files.replace(files).unwrap_or_default()
    }

    pub fn is_expired(&self, now: Timestamp, ttl: chrono::Duration) -> bool {
        now - self.last_touched > ttl
    }

    /// Files written to disk for this record.
    pub fn stored_paths(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .flatten()
            .map(|file| file.stored_path.as_str())
    }
}

// ============================================================================
// DIRECT PAYLOAD
// ============================================================================

/// A raw uploaded part: client filename plus content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything posted in one single-page submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadPart>,
}

// ============================================================================
// SOURCE
// ============================================================================

/// Data source of a commit, decided once at the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionSource {
    Wizard(PendingSubmission),
    Direct(DirectPayload),
}

impl SubmissionSource {
    pub fn flow(&self) -> SubmissionFlow {
        match self {
            SubmissionSource::Wizard(_) => SubmissionFlow::Wizard,
            SubmissionSource::Direct(_) => SubmissionFlow::Direct,
        }
    }

    /// Trimmed submission fields for this source.
    ///
    /// Completing the wizard implies agreement to the terms; the single-page
    /// form records agreement only when its checkbox was ticked.
    pub fn fields(&self) -> SubmissionFields {
        match self {
            SubmissionSource::Wizard(pending) => {
                SubmissionFields::from_lookup(&pending.fields, WIZARD_TIER_KEYS, TermsAgreed::Yes)
            }
            SubmissionSource::Direct(payload) => SubmissionFields::from_lookup(
                &payload.fields,
                DIRECT_TIER_KEYS,
                TermsAgreed::from_checkbox(payload.fields.field("terms_agreed")),
            ),
        }
    }
}
