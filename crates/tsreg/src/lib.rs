//! # tsreg
//!
//! Linear window regression for univariate time series, in Rust.
//!
//! - **Data**: sliding-window pair generation, streaming shuffle, batching
//! - **Model**: a single dense layer from a look-back window to a horizon
//! - **Training**: Adam + MSE with early stopping and per-epoch history
//! - **Persistence**: timestamped save directories with weights, config,
//!   summary and history
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsreg::prelude::*;
//!
//! let series = read_npy_series("data/series.npy")?;
//! let (train, valid) = split_series(&series, 0.2)?;
//!
//! let mut reg = WindowRegressor::new(RegressorConfig::new(8, 1))?;
//! reg.train(train, valid, TrainOptions::default())?;
//!
//! let store = ModelStore::discover(".", "daily-sales")?;
//! let entry = reg.save(&store)?;
//! println!("saved {}", entry.name());
//!
//! let restored = WindowRegressor::from_latest(&store)?;
//! println!("next: {:?}", restored.forecast_next(&series)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `polars-io`: CSV series reading via polars

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use tsreg_core as core;
pub use tsreg_data as data;
pub use tsreg_models as models;
pub use tsreg_train as train;

/// Prelude module for convenient imports.
///
/// ```rust
/// use tsreg::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tsreg_core::{Seed, Split, TSForecastingModel};

    // Data
    #[cfg(feature = "polars-io")]
    pub use tsreg_data::read_csv_series;
    pub use tsreg_data::{
        generate_pairs, read_npy_series, split_series, WindowDataLoader, WindowGenerator,
        WindowPair, WindowStreamExt,
    };

    // Models
    pub use tsreg_models::{LinearForecaster, LinearForecasterConfig, ModelCheckpoint};

    // Training
    pub use tsreg_train::{
        Callback, EarlyStoppingConfig, ModelStore, RegressionTrainer, RegressionTrainerConfig,
        RegressorConfig, SaveSelection, TrainError, TrainOptions, TrainingHistory,
        WindowRegressor,
    };
}
