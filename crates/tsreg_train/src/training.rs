//! Training loop for window regression.
//!
//! Adam optimiser, mean squared error loss, one optimiser step per batch.
//! Validation runs on the inner (non-autodiff) backend after every epoch.

use std::time::Instant;

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::callback::{
    Callback, CallbackContext, CallbackList, EarlyStoppingCallback, HistoryCallback,
    ProgressCallback,
};
use crate::error::{Result, TrainError};
use crate::history::TrainingHistory;
use tsreg_core::TSForecastingModel;
use tsreg_data::{DataError, WindowDataLoader};

/// Early stopping settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingConfig {
    /// Epochs without improvement before stopping.
    pub patience: usize,
    /// Minimum decrease that counts as an improvement.
    pub min_delta: f32,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        Self {
            patience: 15,
            min_delta: 0.0,
        }
    }
}

impl EarlyStoppingConfig {
    /// Create a config with the given patience and no minimum delta.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            ..Default::default()
        }
    }

    /// Set the minimum improvement.
    #[must_use]
    pub fn with_min_delta(mut self, min_delta: f32) -> Self {
        self.min_delta = min_delta;
        self
    }
}

/// Configuration for regression training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTrainerConfig {
    /// Maximum number of epochs.
    pub n_epochs: usize,
    /// Learning rate.
    pub lr: f64,
    /// Whether to log per-epoch progress.
    pub verbose: bool,
    /// Early stopping on the monitored loss; `None` disables it.
    pub early_stopping: Option<EarlyStoppingConfig>,
    /// Return the best-epoch weights instead of the final ones.
    pub restore_best_weights: bool,
}

impl Default for RegressionTrainerConfig {
    fn default() -> Self {
        Self {
            n_epochs: 1000,
            lr: 1e-3,
            verbose: true,
            early_stopping: Some(EarlyStoppingConfig::default()),
            restore_best_weights: false,
        }
    }
}

impl RegressionTrainerConfig {
    /// Set the number of epochs.
    #[must_use]
    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    /// Set the learning rate.
    #[must_use]
    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Enable or disable progress logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set early stopping.
    #[must_use]
    pub fn with_early_stopping(mut self, early_stopping: Option<EarlyStoppingConfig>) -> Self {
        self.early_stopping = early_stopping;
        self
    }

    /// Return the best-epoch weights after training.
    #[must_use]
    pub fn with_restore_best_weights(mut self, restore: bool) -> Self {
        self.restore_best_weights = restore;
        self
    }
}

/// Regression training output with history and final model.
#[derive(Debug)]
pub struct RegressionOutput<M> {
    /// Trained model.
    pub model: M,
    /// Per-epoch losses.
    pub history: TrainingHistory,
    /// Total training time in seconds.
    pub training_time_secs: f64,
}

/// Trainer for window regression models.
pub struct RegressionTrainer<B: AutodiffBackend> {
    config: RegressionTrainerConfig,
    device: B::Device,
    callbacks: CallbackList,
}

impl<B: AutodiffBackend> RegressionTrainer<B> {
    /// Create a new trainer.
    pub fn new(config: RegressionTrainerConfig, device: B::Device) -> Self {
        Self {
            config,
            device,
            callbacks: CallbackList::new(),
        }
    }

    /// Register an extra callback, run after the built-in ones.
    #[must_use]
    pub fn with_callback<C: Callback + 'static>(mut self, callback: C) -> Self {
        self.callbacks.add(callback);
        self
    }

    /// Get the config.
    pub fn config(&self) -> &RegressionTrainerConfig {
        &self.config
    }

    /// Train a forecaster through its [`TSForecastingModel`] forward pass.
    ///
    /// # Errors
    ///
    /// Fails with [`TrainError::InvalidWindow`] if the loaders' window
    /// geometry differs from the model's input or output width, and
    /// otherwise as [`fit_with_forward`](Self::fit_with_forward).
    pub fn fit<M>(
        &mut self,
        model: M,
        train_dl: &WindowDataLoader<'_>,
        valid_dl: &WindowDataLoader<'_>,
    ) -> Result<RegressionOutput<M>>
    where
        M: AutodiffModule<B> + TSForecastingModel<B>,
        M::InnerModule: TSForecastingModel<B::InnerBackend>,
    {
        for dl in [train_dl, valid_dl] {
            let generator = dl.generator();
            if generator.history_len() != model.history_len() {
                return Err(TrainError::InvalidWindow {
                    expected: model.history_len(),
                    got: generator.history_len(),
                });
            }
            if generator.horizon_len() != model.horizon_len() {
                return Err(TrainError::InvalidWindow {
                    expected: model.horizon_len(),
                    got: generator.horizon_len(),
                });
            }
        }

        self.fit_with_forward(
            model,
            train_dl,
            valid_dl,
            |m, x| m.forward(x),
            |m, x| m.forward(x),
        )
    }

    /// Train a regression model using a forward function.
    ///
    /// `forward_fn` runs on the autodiff backend during training and
    /// `valid_forward_fn` on the inner backend during validation.
    ///
    /// # Errors
    ///
    /// Fails with [`DataError::EmptyDataset`] if the training loader yields
    /// no pairs, with [`TrainError::InvalidParameter`] if `n_epochs` is zero
    /// and with [`TrainError::InvalidLearningRate`] for a non-positive or
    /// non-finite learning rate.
    pub fn fit_with_forward<M, F, G>(
        &mut self,
        model: M,
        train_dl: &WindowDataLoader<'_>,
        valid_dl: &WindowDataLoader<'_>,
        forward_fn: F,
        valid_forward_fn: G,
    ) -> Result<RegressionOutput<M>>
    where
        M: AutodiffModule<B> + Clone,
        F: Fn(&M, Tensor<B, 2>) -> Tensor<B, 2>,
        G: Fn(&M::InnerModule, Tensor<B::InnerBackend, 2>) -> Tensor<B::InnerBackend, 2>,
    {
        if train_dl.is_empty() {
            return Err(DataError::EmptyDataset(format!(
                "training split yields no windows of length {}",
                train_dl.generator().window_len()
            ))
            .into());
        }
        if self.config.n_epochs == 0 {
            return Err(TrainError::InvalidParameter(
                "n_epochs must be greater than 0".to_string(),
            ));
        }
        if !(self.config.lr.is_finite() && self.config.lr > 0.0) {
            return Err(TrainError::InvalidLearningRate(format!(
                "learning rate must be positive, got {}",
                self.config.lr
            )));
        }
        if valid_dl.is_empty() {
            tracing::warn!("validation split yields no pairs; monitoring training loss instead");
        }

        let start_time = Instant::now();
        let mut optim = AdamConfig::new().init::<B, M>();

        let mut builtin = CallbackList::new();
        if self.config.verbose {
            builtin.add(ProgressCallback::new());
        }
        if let Some(es) = self.config.early_stopping {
            builtin.add(EarlyStoppingCallback::new(es.patience, es.min_delta));
        }
        let mut history = HistoryCallback::new();

        let mut ctx = CallbackContext::new(self.config.n_epochs, train_dl.n_batches());
        ctx.lr = self.config.lr;

        history.before_fit(&mut ctx)?;
        builtin.before_fit(&mut ctx)?;
        self.callbacks.before_fit(&mut ctx)?;

        let mut current_model = model;
        let mut best_model: Option<M> = None;

        for epoch in 0..self.config.n_epochs {
            ctx.epoch = epoch;
            builtin.before_epoch(&mut ctx)?;
            self.callbacks.before_epoch(&mut ctx)?;

            let train_loss =
                self.train_epoch(&mut current_model, &mut optim, train_dl, epoch, &forward_fn)?;
            let valid_loss = if valid_dl.is_empty() {
                None
            } else {
                Some(self.valid_epoch(&current_model, valid_dl, epoch, &valid_forward_fn)?)
            };

            ctx.train_loss = Some(train_loss);
            ctx.valid_loss = valid_loss;

            history.after_epoch(&mut ctx)?;
            if self.config.restore_best_weights && history.history().best_epoch == Some(epoch) {
                best_model = Some(current_model.clone());
            }

            builtin.after_epoch(&mut ctx)?;
            self.callbacks.after_epoch(&mut ctx)?;

            if ctx.stop_training {
                break;
            }
        }

        history.after_fit(&mut ctx)?;
        builtin.after_fit(&mut ctx)?;
        self.callbacks.after_fit(&mut ctx)?;

        let history = history.into_history();
        let training_time_secs = start_time.elapsed().as_secs_f64();
        tracing::debug!(
            epochs = history.epochs_run(),
            best_epoch = ?history.best_epoch,
            best_loss = ?history.best_loss,
            "fit finished in {:.2}s",
            training_time_secs
        );

        let model = match best_model {
            Some(best) => best,
            None => current_model,
        };

        Ok(RegressionOutput {
            model,
            history,
            training_time_secs,
        })
    }

    /// Returns the pair-weighted mean loss of the epoch.
    fn train_epoch<M, O, F>(
        &self,
        model: &mut M,
        optim: &mut O,
        train_dl: &WindowDataLoader<'_>,
        epoch: usize,
        forward_fn: &F,
    ) -> Result<f32>
    where
        M: AutodiffModule<B> + Clone,
        O: Optimizer<M, B>,
        F: Fn(&M, Tensor<B, 2>) -> Tensor<B, 2>,
    {
        let mut total_loss = 0.0f64;
        let mut n_pairs = 0usize;

        for batch_result in train_dl.iter::<B>(epoch, &self.device) {
            let (x, y) = batch_result?;
            let batch_len = x.dims()[0];

            let preds = forward_fn(model, x);

            // MSE loss
            let diff = preds - y;
            let loss = (diff.clone() * diff).mean();
            let loss_value = loss.clone().into_scalar().elem::<f32>();
            total_loss += f64::from(loss_value) * batch_len as f64;
            n_pairs += batch_len;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, model);
            *model = optim.step(self.config.lr, model.clone(), grads);
        }

        Ok((total_loss / n_pairs.max(1) as f64) as f32)
    }

    fn valid_epoch<M, G>(
        &self,
        model: &M,
        valid_dl: &WindowDataLoader<'_>,
        epoch: usize,
        valid_forward_fn: &G,
    ) -> Result<f32>
    where
        M: AutodiffModule<B>,
        G: Fn(&M::InnerModule, Tensor<B::InnerBackend, 2>) -> Tensor<B::InnerBackend, 2>,
    {
        let inner_model = model.clone().valid();
        let inner_device: <B::InnerBackend as Backend>::Device = self.device.clone().into();

        let mut total_loss = 0.0f64;
        let mut n_pairs = 0usize;

        for batch_result in valid_dl.iter::<B::InnerBackend>(epoch, &inner_device) {
            let (x, y) = batch_result?;
            let batch_len = x.dims()[0];

            let preds = valid_forward_fn(&inner_model, x);

            let diff = preds - y;
            let loss = (diff.clone() * diff).mean();
            total_loss += f64::from(loss.into_scalar().elem::<f32>()) * batch_len as f64;
            n_pairs += batch_len;
        }

        Ok((total_loss / n_pairs.max(1) as f64) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_autodiff::Autodiff;
    use burn_ndarray::NdArray;
    use tsreg_core::{Seed, Split};
    use tsreg_data::WindowGenerator;
    use tsreg_models::{LinearForecaster, LinearForecasterConfig};

    type TestBackend = Autodiff<NdArray>;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|t| (t as f32 * 0.05).sin()).collect()
    }

    fn fit(
        config: RegressionTrainerConfig,
        train: &[f32],
        valid: &[f32],
    ) -> Result<RegressionOutput<LinearForecaster<TestBackend>>> {
        let device = Default::default();
        let generator = WindowGenerator::new(4, 1).unwrap();
        let train_dl = WindowDataLoader::builder(train, generator)
            .batch_size(16)
            .seed(Seed::new(1))
            .build()
            .unwrap();
        let valid_dl = WindowDataLoader::builder(valid, generator)
            .split(Split::Valid)
            .shuffle_buffer(None)
            .build()
            .unwrap();
        let model = LinearForecasterConfig::new(4, 1).init::<TestBackend>(&device);
        let mut trainer = RegressionTrainer::<TestBackend>::new(config, device);
        trainer.fit_with_forward(
            model,
            &train_dl,
            &valid_dl,
            |m, x| m.forward(x),
            |m, x| m.forward(x),
        )
    }

    #[test]
    fn test_regression_trainer_config_default() {
        let config = RegressionTrainerConfig::default();
        assert_eq!(config.n_epochs, 1000);
        assert_eq!(config.lr, 1e-3);
        assert_eq!(config.early_stopping, Some(EarlyStoppingConfig::new(15)));
        assert!(!config.restore_best_weights);
    }

    #[test]
    fn test_loss_decreases() {
        let series = ramp(300);
        let config = RegressionTrainerConfig::default()
            .with_n_epochs(30)
            .with_lr(1e-2)
            .with_early_stopping(None)
            .with_verbose(false);
        let output = fit(config, &series[..240], &series[240..]).unwrap();

        let h = &output.history;
        assert_eq!(h.epochs_run(), 30);
        assert_eq!(h.valid_losses.len(), 30);
        assert!(h.train_losses[29] < h.train_losses[0]);
        assert!(!h.stopped_early);
    }

    #[test]
    fn test_empty_train_split_is_error() {
        let series = ramp(3);
        let err = fit(RegressionTrainerConfig::default(), &series, &series).unwrap_err();
        assert!(matches!(err, TrainError::DataError(DataError::EmptyDataset(_))));
    }

    #[test]
    fn test_invalid_learning_rate() {
        let series = ramp(50);
        let config = RegressionTrainerConfig::default().with_lr(0.0);
        let err = fit(config, &series, &series).unwrap_err();
        assert!(matches!(err, TrainError::InvalidLearningRate(_)));
    }

    #[test]
    fn test_empty_valid_split_monitors_train_loss() {
        let series = ramp(100);
        let config = RegressionTrainerConfig::default()
            .with_n_epochs(5)
            .with_verbose(false);
        let output = fit(config, &series, &series[..2]).unwrap();
        assert!(output.history.valid_losses.is_empty());
        assert_eq!(output.history.train_losses.len(), 5);
        assert!(output.history.best_epoch.is_some());
    }

    #[test]
    fn test_fit_uses_model_forward() {
        let series = ramp(120);
        let device = Default::default();
        let generator = WindowGenerator::new(4, 1).unwrap();
        let train_dl = WindowDataLoader::builder(&series[..100], generator).build().unwrap();
        let valid_dl = WindowDataLoader::builder(&series[100..], generator).build().unwrap();
        let model = LinearForecasterConfig::new(4, 1).init::<TestBackend>(&device);

        let config = RegressionTrainerConfig::default()
            .with_n_epochs(4)
            .with_lr(1e-2)
            .with_verbose(false);
        let output = RegressionTrainer::<TestBackend>::new(config, device)
            .fit(model, &train_dl, &valid_dl)
            .unwrap();

        assert_eq!(output.history.epochs_run(), 4);
        assert_eq!(output.history.valid_losses.len(), 4);
        assert_eq!(output.model.history_len(), 4);
        assert!(output.training_time_secs >= 0.0);
    }

    #[test]
    fn test_fit_rejects_mismatched_window() {
        let series = ramp(120);
        let device = Default::default();
        let generator = WindowGenerator::new(6, 1).unwrap();
        let train_dl = WindowDataLoader::builder(&series[..100], generator).build().unwrap();
        let valid_dl = WindowDataLoader::builder(&series[100..], generator).build().unwrap();
        let model = LinearForecasterConfig::new(4, 1).init::<TestBackend>(&device);

        let err = RegressionTrainer::<TestBackend>::new(RegressionTrainerConfig::default(), device)
            .fit(model, &train_dl, &valid_dl)
            .unwrap_err();
        assert!(matches!(err, TrainError::InvalidWindow { expected: 4, got: 6 }));
    }

    #[test]
    fn test_zero_epochs_rejected() {
        let series = ramp(50);
        let config = RegressionTrainerConfig::default().with_n_epochs(0);
        let err = fit(config, &series, &series).unwrap_err();
        assert!(matches!(err, TrainError::InvalidParameter(_)));
    }

    struct StopAt(usize);

    impl Callback for StopAt {
        fn after_epoch(&mut self, ctx: &mut CallbackContext) -> Result<()> {
            if ctx.epoch == self.0 {
                ctx.stop_training = true;
            }
            Ok(())
        }
    }

    #[test]
    fn test_extra_callback_can_stop_training() {
        let series = ramp(100);
        let config = RegressionTrainerConfig::default()
            .with_n_epochs(50)
            .with_early_stopping(None)
            .with_verbose(false);

        let device = Default::default();
        let generator = WindowGenerator::new(4, 1).unwrap();
        let train_dl = WindowDataLoader::builder(&series[..80], generator).build().unwrap();
        let valid_dl = WindowDataLoader::builder(&series[80..], generator).build().unwrap();
        let model = LinearForecasterConfig::new(4, 1).init::<TestBackend>(&device);

        let mut trainer = RegressionTrainer::<TestBackend>::new(config, device).with_callback(StopAt(2));
        let output = trainer
            .fit_with_forward(model, &train_dl, &valid_dl, |m, x| m.forward(x), |m, x| m.forward(x))
            .unwrap();

        assert_eq!(output.history.epochs_run(), 3);
        assert!(output.history.stopped_early);
    }
}
