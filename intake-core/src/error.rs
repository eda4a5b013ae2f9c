//! Error types for intake domain operations

use thiserror::Error;

/// Errors raised by pure domain helpers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown wizard step: {0}")]
    UnknownStep(String),

    #[error("Wizard step {step} is out of range 1..={max}")]
    StepOutOfRange { step: u8, max: u8 },

    #[error("Unknown submission flow: {0}")]
    UnknownFlow(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
