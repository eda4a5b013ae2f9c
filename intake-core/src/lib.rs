//! Intake Core - Domain Types
//!
//! Plain data structures and pure helpers shared by the storage and API
//! crates: the submission field catalogue, wizard steps, upload filename
//! rules, and the explicit wizard/direct submission source.

pub mod error;
pub mod fields;
pub mod source;
pub mod submission;
pub mod upload;
pub mod wizard;

pub use error::{CoreError, CoreResult};
pub use fields::{FieldLookup, SubmissionFields, TermsAgreed, FORM_FIELDS, SUBMISSION_COLUMNS};
pub use source::{
    DirectPayload, PendingFile, PendingSubmission, SubmissionFlow, SubmissionSource, UploadPart,
    FLOW_FIELD,
};
pub use submission::{
    format_timestamp, NewUploadedFile, Submission, SubmissionDetail, SubmissionId,
    SubmissionSummary, Timestamp, UploadedFile,
};
pub use upload::{is_allowed_file, sanitize_filename, stored_file_name, ALLOWED_EXTENSIONS};
pub use wizard::{FieldDef, FieldKind, PlanTier, StepOutcome, StepPage, WizardStep, FINAL_STEP, UPLOAD_STEP};
