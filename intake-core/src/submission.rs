//! Persisted submission records

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::SubmissionFields;

/// Auto-increment row id of a submission.
pub type SubmissionId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// ISO-8601 text form used for every stored timestamp.
///
/// Fixed width with microseconds, so lexical order equals time order.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One completed intake as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    #[serde(flatten)]
    pub fields: SubmissionFields,
    pub created_at: String,
}

/// One stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: i64,
    pub submission_id: SubmissionId,
    pub filename: String,
    pub stored_path: String,
    pub uploaded_at: String,
}

/// Attachment metadata to insert alongside a new submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUploadedFile {
    pub filename: String,
    pub stored_path: String,
}

/// Admin listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    #[serde(flatten)]
    pub submission: Submission,
    pub file_count: i64,
}

/// Admin detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub files: Vec<UploadedFile>,
}
