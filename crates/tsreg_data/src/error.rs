//! Error types for tsreg_data.

use thiserror::Error;

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur in data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// A window, buffer or split parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The sequence yields no windows.
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// Batch size error.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(String),

    /// File format error.
    #[error("File format error: {0}")]
    FormatError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] tsreg_core::CoreError),
}
