//! Error types for training and model persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Errors that can occur during training, saving and loading.
#[derive(Error, Debug)]
pub enum TrainError {
    /// Save, predict or inspect called before a model was trained or loaded.
    #[error("Model has not been trained; call train() or load() first")]
    ModelNotTrained,

    /// The model directory holds no timestamped save.
    #[error("No saved model found in {0}")]
    NoSavedModel(PathBuf),

    /// No save matches the requested stamp or name.
    #[error("No save named '{name}' in {dir}")]
    SaveNotFound {
        /// Requested stamp or directory name.
        name: String,
        /// Model directory that was searched.
        dir: PathBuf,
    },

    /// Several saves share the requested minute.
    #[error("Several saves match '{stamp}': {}", candidates.join(", "))]
    AmbiguousSave {
        /// Requested minute stamp.
        stamp: String,
        /// Matching save directory names.
        candidates: Vec<String>,
    },

    /// A directory in the model store is not a valid save stamp.
    #[error("Malformed save directory '{name}' in {dir}")]
    MalformedSave {
        /// Offending directory name.
        name: String,
        /// Model directory that contains it.
        dir: PathBuf,
    },

    /// No `DataStore` directory above the starting directory.
    #[error("No DataStore directory found above {0}")]
    ProjectRootNotFound(PathBuf),

    /// A prediction window has the wrong length.
    #[error("Invalid window: expected {expected} observations, got {got}")]
    InvalidWindow {
        /// Required window length.
        expected: usize,
        /// Supplied window length.
        got: usize,
    },

    /// A training option is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid learning rate.
    #[error("Invalid learning rate: {0}")]
    InvalidLearningRate(String),

    /// Checkpoint error.
    #[error("Checkpoint error: {0}")]
    CheckpointError(#[from] tsreg_models::CheckpointError),

    /// Callback error.
    #[error("Callback error: {0}")]
    CallbackError(String),

    /// Data error.
    #[error("Data error: {0}")]
    DataError(#[from] tsreg_data::DataError),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] tsreg_core::CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
