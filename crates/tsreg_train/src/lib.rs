//! # tsreg_train
//!
//! Training, persistence and the high-level regressor for tsreg.
//!
//! This crate provides:
//! - [`RegressionTrainer`]: Adam + MSE fit loop over window dataloaders
//! - Callback system with lifecycle hooks (progress, early stopping, history)
//! - [`ModelStore`]: timestamped on-disk saves
//! - [`WindowRegressor`]: build, train, predict, save and load in one type
//!
//! ## Example
//!
//! ```rust,no_run
//! use tsreg_train::{ModelStore, RegressorConfig, TrainOptions, WindowRegressor};
//!
//! let series: Vec<f32> = (0..500).map(|t| (t as f32 * 0.05).cos()).collect();
//! let (train, valid) = series.split_at(400);
//!
//! let mut reg = WindowRegressor::new(RegressorConfig::default())?;
//! let history = reg.train(train, valid, TrainOptions::default())?;
//! println!("best epoch: {:?}", history.best_epoch);
//!
//! let store = ModelStore::discover(".", "cosine")?;
//! reg.save(&store)?;
//! # Ok::<(), tsreg_train::TrainError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callback;
pub mod error;
pub mod export;
pub mod history;
pub mod regressor;
pub mod store;
pub mod training;

pub use callback::{
    Callback, CallbackContext, CallbackList, EarlyStoppingCallback, HistoryCallback,
    ProgressCallback,
};
pub use error::{Result, TrainError};
pub use history::TrainingHistory;
pub use regressor::{
    RegressorConfig, SavedModelConfig, TrainOptions, WindowRegressor, CONFIG_FILE, DEFAULT_LR,
    HISTORY_FILE, MODEL_FILE, SUMMARY_FILE,
};
pub use store::{parse_minute, ModelStore, SaveEntry, SaveSelection, SaveStamp, STAMP_FORMAT};
// Re-export the model trait from tsreg_core for convenience
pub use tsreg_core::TSForecastingModel;
pub use training::{
    EarlyStoppingConfig, RegressionOutput, RegressionTrainer, RegressionTrainerConfig,
};
