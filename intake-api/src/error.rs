//! Error Types for the intake service
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct carrying a code and a visitor-facing message
//! - ErrorCode enum mapping each failure category to a status code
//! - IntoResponse implementation rendering the HTML failure page
//!
//! Internal failures are logged in full and surface only as generic pages.

use axum::{
    extract::multipart::MultipartError,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use intake_core::CoreError;
use intake_storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::ADMIN_REALM;
use crate::views;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for failure pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// Missing or wrong admin credentials
    Unauthorized,

    // ========================================================================
    // Request Errors (400, 413)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Body could not be decoded as a form
    InvalidFormat,

    /// A wizard commit arrived without a live pending submission
    NoPendingSubmission,

    /// Body exceeds the configured upload limit
    PayloadTooLarge,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Wizard step outside the catalogue
    StepNotFound,

    /// Requested submission does not exist
    SubmissionNotFound,

    /// No route matches the path
    PageNotFound,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Upload directory operation failed
    FileStoreError,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,

            ErrorCode::InvalidInput
            | ErrorCode::InvalidFormat
            | ErrorCode::NoPendingSubmission => StatusCode::BAD_REQUEST,

            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::StepNotFound | ErrorCode::SubmissionNotFound | ErrorCode::PageNotFound => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::DatabaseError | ErrorCode::FileStoreError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "The form could not be read",
            ErrorCode::NoPendingSubmission => {
                "Your onboarding session has expired. Please start again."
            }
            ErrorCode::PayloadTooLarge => "The upload is larger than we can accept",
            ErrorCode::StepNotFound => "Step not found",
            ErrorCode::SubmissionNotFound => "Submission not found",
            ErrorCode::PageNotFound => "Page not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "We could not save your submission",
            ErrorCode::FileStoreError => "We could not store your files",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Failure returned by handlers and extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Visitor-facing message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    pub fn no_pending_submission() -> Self {
        Self::from_code(ErrorCode::NoPendingSubmission)
    }

    pub fn payload_too_large() -> Self {
        Self::from_code(ErrorCode::PayloadTooLarge)
    }

    pub fn step_not_found(step: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StepNotFound, format!("Step {} not found", step))
    }

    pub fn submission_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SubmissionNotFound,
            format!("Submission {} not found", id),
        )
    }

    pub fn page_not_found() -> Self {
        Self::from_code(ErrorCode::PageNotFound)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error() -> Self {
        Self::from_code(ErrorCode::DatabaseError)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Failures render as an HTML page; a 401 also carries the Basic challenge.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let page = views::error_page(status, &self.message);
        let mut response = (status, page).into_response();

        if self.code == ErrorCode::Unauthorized {
            let challenge = format!("Basic realm=\"{}\"", ADMIN_REALM);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

// ============================================================================
// CONVERSIONS FROM LOWER LAYERS
// ============================================================================

/// Convert from StorageError to ApiError.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        // Log the full error; the visitor only sees a generic page
        tracing::error!("Storage error: {:?}", err);

        match err {
            StorageError::Sqlx(sqlx::Error::PoolTimedOut) | StorageError::Sqlx(sqlx::Error::PoolClosed) => {
                ApiError::service_unavailable("Database connection unavailable")
            }
            StorageError::Sqlx(_) => ApiError::database_error(),
            StorageError::NotFound(what) => ApiError::new(ErrorCode::SubmissionNotFound, what),
            StorageError::Io(_) | StorageError::OutsideRoot(_) | StorageError::Collision(_) => {
                ApiError::from_code(ErrorCode::FileStoreError)
            }
        }
    }
}

/// Convert from CoreError to ApiError.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownStep(step) => ApiError::step_not_found(step),
            CoreError::StepOutOfRange { step, .. } => ApiError::step_not_found(format!("step-{}", step)),
            CoreError::UnknownFlow(flow) => {
                ApiError::invalid_input(format!("Unknown submission flow '{}'", flow))
            }
        }
    }
}

/// Convert from a multipart decoding failure to ApiError.
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(error = %err.body_text(), "Multipart body over limit");
            ApiError::payload_too_large()
        } else {
            tracing::warn!(error = %err.body_text(), "Malformed multipart body");
            ApiError::invalid_format("The form could not be read")
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
