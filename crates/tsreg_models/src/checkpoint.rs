//! Model checkpointing.
//!
//! Weights are written with burn's named MessagePack recorder at full
//! precision, so a reloaded model is bit-for-bit equal to the saved one.
//!
//! # Example
//!
//! ```rust,ignore
//! use tsreg_models::checkpoint::ModelCheckpoint;
//! use tsreg_models::LinearForecasterConfig;
//!
//! let config = LinearForecasterConfig::new(4, 1);
//! let model = config.init::<NdArray>(&device);
//! model.save_checkpoint("run/model.mpk")?;
//!
//! let restored = config.init::<NdArray>(&device).load_checkpoint("run/model.mpk", &device)?;
//! ```

use std::path::Path;

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};

/// Checkpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Failed to write weights.
    #[error("Failed to save checkpoint: {0}")]
    Save(String),

    /// Failed to read weights.
    #[error("Failed to load checkpoint: {0}")]
    Load(String),
}

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Save the parameters of `model` to `path`.
///
/// The recorder forces the `.mpk` extension onto `path`.
pub fn save_model<B, M>(model: &M, path: impl AsRef<Path>) -> Result<()>
where
    B: Backend,
    M: Module<B>,
{
    let path = path.as_ref();
    let record = model.clone().into_record();

    recorder()
        .record(record, path.to_path_buf())
        .map_err(|e| CheckpointError::Save(format!("{}: {}", path.display(), e)))?;

    Ok(())
}

/// Load a parameter record from `path` onto `device`.
pub fn load_record<B, M>(path: impl AsRef<Path>, device: &B::Device) -> Result<M::Record>
where
    B: Backend,
    M: Module<B>,
{
    let path = path.as_ref();
    recorder()
        .load(path.to_path_buf(), device)
        .map_err(|e| CheckpointError::Load(format!("{}: {}", path.display(), e)))
}

/// Checkpoint helpers available on every module.
pub trait ModelCheckpoint<B: Backend>: Module<B> + Sized {
    /// Save the module parameters to `path`.
    fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<()> {
        save_model::<B, Self>(self, path)
    }

    /// Replace the module parameters with the ones stored at `path`.
    fn load_checkpoint(self, path: impl AsRef<Path>, device: &B::Device) -> Result<Self> {
        let record = load_record::<B, Self>(path, device)?;
        Ok(self.load_record(record))
    }
}

impl<B: Backend, M: Module<B>> ModelCheckpoint<B> for M {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearForecasterConfig;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_checkpoint_restores_exact_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.mpk");
        let device = Default::default();
        let config = LinearForecasterConfig::new(5, 2);

        let model = config.init::<TestBackend>(&device);
        model.save_checkpoint(&path).unwrap();
        assert!(path.exists());

        let restored = config
            .init::<TestBackend>(&device)
            .load_checkpoint(&path, &device)
            .unwrap();

        assert_eq!(model.weights(), restored.weights());
        assert_eq!(model.bias(), restored.bias());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = LinearForecasterConfig::default().init::<TestBackend>(&device);
        let err = model
            .load_checkpoint(dir.path().join("absent.mpk"), &device)
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Load(_)));
    }
}
