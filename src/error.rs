//! Error types for glmselect

use thiserror::Error;

/// Main error type for fitting and selection operations
///
/// Numerical trouble inside an optimizer run (singular curvature, non-finite
/// objective) is not an error: it is reported through the fit's status code
/// so a search can keep going. These variants cover structural misuse and IO.
#[derive(Error, Debug)]
pub enum GlmSelectError {
    #[error("Invalid family: {reason}")]
    InvalidFamily { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Invalid candidate set: {reason}")]
    InvalidCandidateSet { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for glmselect operations
pub type Result<T> = std::result::Result<T, GlmSelectError>;
