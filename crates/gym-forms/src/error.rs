//! Error types for the form engine
//!
//! Validation failures are not errors: they travel as data
//! (`FieldError`, `SubmitOutcome::Blocked`). This enum covers misuse of the
//! engine, broken definitions and caller-level submit failures.

use thiserror::Error;

/// Form engine error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// No descriptor with this name
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// Operation requires an open form
    #[error("form is not open")]
    NotOpen,

    /// A submission is already running
    #[error("a submission is already in flight")]
    SubmitInFlight,

    /// Field pattern failed to compile
    #[error("invalid pattern for field {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Inconsistent form definition
    #[error("invalid form definition: {0}")]
    InvalidDefinition(String),

    /// The caller's submit handler failed
    #[error("submit failed: {0}")]
    Submit(#[source] anyhow::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the form engine
pub type Result<T> = std::result::Result<T, FormsError>;
