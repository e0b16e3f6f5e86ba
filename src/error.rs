//! Error types for gather validation and pick bookkeeping.

use thiserror::Error;

/// Result type alias for picker operations.
pub type Result<T> = std::result::Result<T, PickerError>;

/// Domain errors surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PickerError {
    /// The gather cannot be rendered (empty, ragged, bad sampling rate).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Imported picks were made on a different set of files.
    #[error("picks do not match imported data: expected {expected} files, found {found}")]
    PickMismatch { expected: usize, found: usize },

    /// No gather file in the chosen directory.
    #[error("no compatible gather file in {0}")]
    EmptySurvey(String),
}
