//! High-level window regressor.
//!
//! [`WindowRegressor`] wires the window generator, the linear forecaster, the
//! trainer and the model store together behind a small API: build, train,
//! predict, save and load. Each instance owns its model; nothing is shared
//! between instances.
//!
//! # Example
//!
//! ```rust,no_run
//! use tsreg_train::{ModelStore, RegressorConfig, TrainOptions, WindowRegressor};
//!
//! let series: Vec<f32> = (0..400).map(|t| (t as f32 * 0.1).sin()).collect();
//! let (train, valid) = series.split_at(320);
//!
//! let mut reg = WindowRegressor::new(RegressorConfig::new(8, 2))?;
//! reg.build_model(1e-2)?;
//! reg.train(train, valid, TrainOptions::default().with_epochs(50))?;
//!
//! let store = ModelStore::new("DataStore/SavedModels/Forecasters", "sine");
//! let entry = reg.save(&store)?;
//! println!("saved to {}", entry.path.display());
//!
//! let restored = WindowRegressor::from_latest(&store)?;
//! let next = restored.forecast_next(&series)?;
//! assert_eq!(next.len(), 2);
//! # Ok::<(), tsreg_train::TrainError>(())
//! ```

use burn::module::AutodiffModule;
use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainError};
use crate::export::{load_json, save_json, save_text};
use crate::history::TrainingHistory;
use crate::store::{ModelStore, SaveEntry, SaveSelection};
use crate::training::{EarlyStoppingConfig, RegressionTrainer, RegressionTrainerConfig};
use tsreg_core::{Seed, Split};
use tsreg_data::{
    DataError, WindowDataLoader, WindowGenerator, DEFAULT_BATCH_SIZE, DEFAULT_SHUFFLE_BUFFER,
};
use tsreg_models::{LinearForecaster, LinearForecasterConfig, ModelCheckpoint};

/// Type alias for the training backend (CPU with autodiff).
type TrainBackend = Autodiff<NdArray>;

/// Type alias for the inference backend (CPU only).
type InferBackend = NdArray;

/// Learning rate used when [`WindowRegressor::build_model`] is not called.
pub const DEFAULT_LR: f64 = 1e-3;

/// Weights file inside a save directory.
pub const MODEL_FILE: &str = "model.mpk";
/// Human-readable summary inside a save directory.
pub const SUMMARY_FILE: &str = "model_summary.txt";
/// Model and window configuration inside a save directory.
pub const CONFIG_FILE: &str = "model_config.json";
/// Training history inside a save directory.
pub const HISTORY_FILE: &str = "history.json";

/// Window and data-pipeline settings of a [`WindowRegressor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressorConfig {
    /// Observations per input window.
    pub look_back: usize,
    /// Observations predicted per window.
    pub forecast: usize,
    /// Shuffle reservoir size; `None` trains in chronological order.
    pub shuffle_buffer: Option<usize>,
    /// Pairs per batch.
    pub batch_size: usize,
    /// Seed for weight initialisation and shuffling.
    ///
    /// Initialisation goes through the NdArray backend's process-wide RNG,
    /// so runs are only reproducible when no other thread builds a model at
    /// the same time.
    pub seed: u64,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            look_back: 4,
            forecast: 1,
            shuffle_buffer: Some(DEFAULT_SHUFFLE_BUFFER),
            batch_size: DEFAULT_BATCH_SIZE,
            seed: 42,
        }
    }
}

impl RegressorConfig {
    /// Create a config with the given window geometry.
    pub fn new(look_back: usize, forecast: usize) -> Self {
        Self {
            look_back,
            forecast,
            ..Default::default()
        }
    }

    /// Set the shuffle reservoir size.
    #[must_use]
    pub fn with_shuffle_buffer(mut self, shuffle_buffer: Option<usize>) -> Self {
        self.shuffle_buffer = shuffle_buffer;
        self
    }

    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Per-call training options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    /// Maximum number of epochs.
    pub epochs: usize,
    /// Whether to stop once the monitored loss stalls.
    pub early_stopping: bool,
    /// Epochs without improvement before stopping.
    pub patience: usize,
    /// Minimum decrease that counts as an improvement.
    pub min_delta: f32,
    /// Keep the best-epoch weights instead of the final ones.
    pub restore_best_weights: bool,
    /// Log per-epoch progress.
    pub verbose: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 1000,
            early_stopping: true,
            patience: 15,
            min_delta: 0.0,
            restore_best_weights: false,
            verbose: true,
        }
    }
}

impl TrainOptions {
    /// Set the maximum number of epochs.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Enable or disable early stopping.
    #[must_use]
    pub fn with_early_stopping(mut self, early_stopping: bool) -> Self {
        self.early_stopping = early_stopping;
        self
    }

    /// Set the early stopping patience.
    #[must_use]
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Set the minimum improvement.
    #[must_use]
    pub fn with_min_delta(mut self, min_delta: f32) -> Self {
        self.min_delta = min_delta;
        self
    }

    /// Keep the best-epoch weights.
    #[must_use]
    pub fn with_restore_best_weights(mut self, restore: bool) -> Self {
        self.restore_best_weights = restore;
        self
    }

    /// Enable or disable progress logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn trainer_config(&self, lr: f64) -> RegressionTrainerConfig {
        let early_stopping = self.early_stopping.then(|| {
            EarlyStoppingConfig::new(self.patience).with_min_delta(self.min_delta)
        });
        RegressionTrainerConfig::default()
            .with_n_epochs(self.epochs)
            .with_lr(lr)
            .with_verbose(self.verbose)
            .with_early_stopping(early_stopping)
            .with_restore_best_weights(self.restore_best_weights)
    }
}

/// Contents of `model_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModelConfig {
    /// Window and pipeline settings.
    pub regressor: RegressorConfig,
    /// Layer settings.
    pub model: LinearForecasterConfig,
    /// Learning rate the model was trained with.
    pub lr: f64,
}

/// A linear window regressor with train, predict, save and load.
pub struct WindowRegressor {
    config: RegressorConfig,
    generator: WindowGenerator,
    model_config: LinearForecasterConfig,
    lr: f64,
    untrained: Option<LinearForecaster<TrainBackend>>,
    model: Option<LinearForecaster<InferBackend>>,
    history: Option<TrainingHistory>,
    device: <InferBackend as Backend>::Device,
}

impl WindowRegressor {
    /// Create a regressor.
    ///
    /// # Errors
    ///
    /// Fails if either window length, the batch size or the shuffle buffer
    /// is zero.
    pub fn new(config: RegressorConfig) -> Result<Self> {
        let generator = WindowGenerator::new(config.look_back, config.forecast)?;
        if config.batch_size == 0 {
            return Err(
                DataError::InvalidBatchSize("Batch size must be greater than 0".to_string()).into(),
            );
        }
        if config.shuffle_buffer == Some(0) {
            return Err(
                DataError::InvalidParameter("Shuffle buffer must be greater than 0".to_string()).into(),
            );
        }

        let model_config = LinearForecasterConfig::new(config.look_back, config.forecast);
        Ok(Self {
            config,
            generator,
            model_config,
            lr: DEFAULT_LR,
            untrained: None,
            model: None,
            history: None,
            device: Default::default(),
        })
    }

    /// Build a fresh model with `look_back` inputs and `forecast` outputs,
    /// to be trained with learning rate `lr`.
    ///
    /// Weights are initialised from the configured seed.
    pub fn build_model(&mut self, lr: f64) -> Result<()> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(TrainError::InvalidLearningRate(format!(
                "learning rate must be positive, got {}",
                lr
            )));
        }
        let device = <TrainBackend as Backend>::Device::default();
        <TrainBackend as Backend>::seed(self.config.seed);
        self.untrained = Some(self.model_config.init::<TrainBackend>(&device));
        self.lr = lr;
        Ok(())
    }

    /// Train on `train_seq`, validating on `valid_seq`.
    ///
    /// Builds a model with [`DEFAULT_LR`] if [`build_model`](Self::build_model)
    /// was not called. Every call starts from freshly built weights.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidParameter`] for `epochs == 0`; the
    /// regressor then stays untrained.
    pub fn train(
        &mut self,
        train_seq: &[f32],
        valid_seq: &[f32],
        options: TrainOptions,
    ) -> Result<&TrainingHistory> {
        let model = match self.untrained.take() {
            Some(model) => model,
            None => {
                self.build_model(self.lr)?;
                self.untrained.take().ok_or(TrainError::ModelNotTrained)?
            }
        };

        let seed = Seed::new(self.config.seed);
        let train_dl = WindowDataLoader::builder(train_seq, self.generator)
            .batch_size(self.config.batch_size)
            .shuffle_buffer(self.config.shuffle_buffer)
            .seed(seed)
            .split(Split::Train)
            .build()?;
        let valid_dl = WindowDataLoader::builder(valid_seq, self.generator)
            .batch_size(self.config.batch_size)
            .shuffle_buffer(None)
            .split(Split::Valid)
            .build()?;

        tracing::info!(
            look_back = self.config.look_back,
            forecast = self.config.forecast,
            train_pairs = train_dl.n_pairs(),
            valid_pairs = valid_dl.n_pairs(),
            "training linear forecaster"
        );

        let mut trainer = RegressionTrainer::<TrainBackend>::new(
            options.trainer_config(self.lr),
            Default::default(),
        );
        let output = trainer.fit(model, &train_dl, &valid_dl)?;

        self.model = Some(output.model.valid());
        Ok(&*self.history.insert(output.history))
    }

    /// Predict the `forecast` observations following one `look_back` window.
    pub fn predict(&self, window: &[f32]) -> Result<Vec<f32>> {
        let mut out = self.predict_batch([window])?;
        out.pop().ok_or(TrainError::ModelNotTrained)
    }

    /// Predict a forecast for each window.
    pub fn predict_batch<I, W>(&self, windows: I) -> Result<Vec<Vec<f32>>>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<[f32]>,
    {
        let model = self.model()?;

        let mut data = Vec::new();
        let mut n = 0;
        for window in windows {
            let window = window.as_ref();
            self.check_window(window)?;
            data.extend_from_slice(window);
            n += 1;
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let input = Tensor::<InferBackend, 2>::from_data(
            TensorData::new(data, [n, self.config.look_back]),
            &self.device,
        );
        let preds: Vec<f32> = model.forward(input).into_data().iter::<f32>().collect();

        Ok(preds
            .chunks(self.config.forecast)
            .map(<[f32]>::to_vec)
            .collect())
    }

    /// Forecast the observations following `sequence` from its last
    /// `look_back` values.
    pub fn forecast_next(&self, sequence: &[f32]) -> Result<Vec<f32>> {
        let look_back = self.config.look_back;
        if sequence.len() < look_back {
            return Err(TrainError::InvalidWindow {
                expected: look_back,
                got: sequence.len(),
            });
        }
        self.predict(&sequence[sequence.len() - look_back..])
    }

    fn check_window(&self, window: &[f32]) -> Result<()> {
        if window.len() != self.config.look_back {
            return Err(TrainError::InvalidWindow {
                expected: self.config.look_back,
                got: window.len(),
            });
        }
        Ok(())
    }

    /// Save to a new timestamped directory of `store`, stamped with the
    /// current local time.
    pub fn save(&self, store: &ModelStore) -> Result<SaveEntry> {
        self.save_at(store, Local::now().naive_local())
    }

    /// Save to a new directory of `store` stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::ModelNotTrained`] before a successful
    /// [`train`](Self::train) or [`load`](Self::load); nothing is written in
    /// that case.
    pub fn save_at(&self, store: &ModelStore, now: NaiveDateTime) -> Result<SaveEntry> {
        let model = self.model()?;
        let entry = store.write_run_dir(now, |dir| {
            save_text(&model.summary(), &dir.join(SUMMARY_FILE))?;
            save_json(
                &SavedModelConfig {
                    regressor: self.config.clone(),
                    model: self.model_config.clone(),
                    lr: self.lr,
                },
                &dir.join(CONFIG_FILE),
            )?;
            match &self.history {
                Some(history) => save_json(history, &dir.join(HISTORY_FILE))?,
                None => save_json(&TrainingHistory::default(), &dir.join(HISTORY_FILE))?,
            }
            model.save_checkpoint(dir.join(MODEL_FILE))?;
            Ok(())
        })?;

        tracing::info!(
            model_id = store.model_id(),
            save = %entry.name(),
            path = %entry.path.display(),
            "saved model"
        );
        Ok(entry)
    }

    /// Load the save chosen by `selection` from `store`.
    pub fn load(store: &ModelStore, selection: &SaveSelection) -> Result<Self> {
        let entry = store.resolve(selection)?;
        let saved: SavedModelConfig = load_json(&entry.path.join(CONFIG_FILE))?;
        let history: TrainingHistory = load_json(&entry.path.join(HISTORY_FILE))?;

        let mut regressor = Self::new(saved.regressor)?;
        if saved.model.history_len != regressor.config.look_back
            || saved.model.horizon_len != regressor.config.forecast
        {
            return Err(TrainError::SerializationError(format!(
                "{}: layer shape {}x{} does not match window {}x{}",
                entry.path.join(CONFIG_FILE).display(),
                saved.model.history_len,
                saved.model.horizon_len,
                regressor.config.look_back,
                regressor.config.forecast
            )));
        }

        let model = saved
            .model
            .init::<InferBackend>(&regressor.device)
            .load_checkpoint(entry.path.join(MODEL_FILE), &regressor.device)?;

        regressor.model_config = saved.model;
        regressor.lr = saved.lr;
        regressor.model = Some(model);
        regressor.history = Some(history);

        tracing::info!(
            model_id = store.model_id(),
            save = %entry.name(),
            "loaded model"
        );
        Ok(regressor)
    }

    /// Load the most recent save of `store`.
    pub fn from_latest(store: &ModelStore) -> Result<Self> {
        Self::load(store, &SaveSelection::Latest)
    }

    /// The trained model.
    pub fn model(&self) -> Result<&LinearForecaster<InferBackend>> {
        self.model.as_ref().ok_or(TrainError::ModelNotTrained)
    }

    /// History of the last training run, or of the loaded save.
    pub fn history(&self) -> Option<&TrainingHistory> {
        self.history.as_ref()
    }

    /// Check if a trained or loaded model is available.
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Get the config.
    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    /// Learning rate used for training.
    pub fn lr(&self) -> f64 {
        self.lr
    }
}

impl std::fmt::Debug for WindowRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRegressor")
            .field("config", &self.config)
            .field("lr", &self.lr)
            .field("trained", &self.is_trained())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(epochs: usize) -> TrainOptions {
        TrainOptions::default()
            .with_epochs(epochs)
            .with_early_stopping(false)
            .with_verbose(false)
    }

    #[test]
    fn test_defaults() {
        let config = RegressorConfig::default();
        assert_eq!(config.look_back, 4);
        assert_eq!(config.forecast, 1);
        assert_eq!(config.shuffle_buffer, Some(2000));
        assert_eq!(config.batch_size, 32);

        let options = TrainOptions::default();
        assert_eq!(options.epochs, 1000);
        assert!(options.early_stopping);
        assert_eq!(options.patience, 15);
    }

    #[test]
    fn test_new_rejects_zero_lengths() {
        assert!(WindowRegressor::new(RegressorConfig::new(0, 1)).is_err());
        assert!(WindowRegressor::new(RegressorConfig::new(4, 0)).is_err());
        assert!(WindowRegressor::new(RegressorConfig::default().with_batch_size(0)).is_err());
        assert!(WindowRegressor::new(RegressorConfig::default().with_shuffle_buffer(Some(0))).is_err());
    }

    #[test]
    fn test_untrained_regressor() {
        let reg = WindowRegressor::new(RegressorConfig::default()).unwrap();
        assert!(!reg.is_trained());
        assert!(reg.history().is_none());
        assert!(matches!(reg.predict(&[0.0; 4]), Err(TrainError::ModelNotTrained)));
    }

    #[test]
    fn test_build_model_rejects_bad_lr() {
        let mut reg = WindowRegressor::new(RegressorConfig::default()).unwrap();
        assert!(matches!(reg.build_model(-1.0), Err(TrainError::InvalidLearningRate(_))));
        reg.build_model(5e-3).unwrap();
        assert_eq!(reg.lr(), 5e-3);
    }

    #[test]
    fn test_train_and_predict_shapes() {
        let series: Vec<f32> = (0..200).map(|t| (t as f32 * 0.1).sin()).collect();
        let mut reg = WindowRegressor::new(RegressorConfig::new(6, 3)).unwrap();
        let history = reg.train(&series[..160], &series[160..], quiet(3)).unwrap();
        assert_eq!(history.epochs_run(), 3);
        assert!(reg.is_trained());

        assert_eq!(reg.predict(&series[..6]).unwrap().len(), 3);
        assert_eq!(reg.forecast_next(&series).unwrap().len(), 3);

        let batch = reg
            .predict_batch(vec![series[..6].to_vec(), series[6..12].to_vec()])
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|p| p.len() == 3));
        assert_eq!(batch[0], reg.predict(&series[..6]).unwrap());
    }

    #[test]
    fn test_predict_rejects_wrong_window() {
        let series: Vec<f32> = (0..60).map(|t| t as f32 / 60.0).collect();
        let mut reg = WindowRegressor::new(RegressorConfig::default()).unwrap();
        reg.train(&series, &[], quiet(1)).unwrap();

        assert!(matches!(
            reg.predict(&[1.0, 2.0]),
            Err(TrainError::InvalidWindow { expected: 4, got: 2 })
        ));
        assert!(matches!(
            reg.forecast_next(&[1.0]),
            Err(TrainError::InvalidWindow { expected: 4, got: 1 })
        ));
    }

    #[test]
    fn test_zero_epochs_leaves_regressor_untrained() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path(), "demo");
        let series: Vec<f32> = (0..60).map(|t| t as f32 / 60.0).collect();
        let mut reg = WindowRegressor::new(RegressorConfig::default()).unwrap();

        let err = reg.train(&series[..48], &series[48..], quiet(0)).unwrap_err();
        assert!(matches!(err, TrainError::InvalidParameter(_)));
        assert!(!reg.is_trained());
        assert!(matches!(reg.save(&store), Err(TrainError::ModelNotTrained)));
    }

    #[test]
    fn test_save_before_train_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path(), "demo");
        let reg = WindowRegressor::new(RegressorConfig::default()).unwrap();

        assert!(matches!(reg.save(&store), Err(TrainError::ModelNotTrained)));
        assert!(!store.model_dir().exists());
    }
}
