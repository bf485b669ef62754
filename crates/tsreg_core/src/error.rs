//! Error types for tsreg_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in tsreg_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Tensor or buffer length does not match the expected shape.
    #[error("Shape mismatch: expected {expected} values, got {got}")]
    ShapeMismatch {
        /// Expected number of values.
        expected: usize,
        /// Actual number of values.
        got: usize,
    },
}
