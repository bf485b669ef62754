//! Callback system for training hooks.

use crate::error::Result;
use crate::history::TrainingHistory;

/// Context passed to callbacks containing training state.
#[derive(Debug, Clone)]
pub struct CallbackContext {
    /// Current epoch (0-indexed).
    pub epoch: usize,
    /// Total number of epochs.
    pub n_epochs: usize,
    /// Number of training batches per epoch.
    pub n_batches: usize,
    /// Learning rate.
    pub lr: f64,
    /// Mean training loss of the current epoch.
    pub train_loss: Option<f32>,
    /// Mean validation loss of the current epoch; `None` when the
    /// validation split yields no pairs.
    pub valid_loss: Option<f32>,
    /// Whether to stop training after the current epoch.
    pub stop_training: bool,
}

impl CallbackContext {
    /// Create a new callback context.
    pub fn new(n_epochs: usize, n_batches: usize) -> Self {
        Self {
            epoch: 0,
            n_epochs,
            n_batches,
            lr: 0.0,
            train_loss: None,
            valid_loss: None,
            stop_training: false,
        }
    }

    /// The loss used for early stopping and best-model tracking: validation
    /// loss if available, else training loss.
    pub fn monitored_loss(&self) -> Option<f32> {
        self.valid_loss.or(self.train_loss)
    }

    /// Get progress as a fraction (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        if self.n_epochs == 0 {
            return 1.0;
        }
        self.epoch as f32 / self.n_epochs as f32
    }
}

/// Trait for training callbacks.
///
/// Callbacks allow customization of the training loop at various points.
pub trait Callback: Send + Sync {
    /// Called before training starts.
    fn before_fit(&mut self, _ctx: &mut CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called after training completes.
    fn after_fit(&mut self, _ctx: &mut CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called before each epoch.
    fn before_epoch(&mut self, _ctx: &mut CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called after each epoch, once both losses are known.
    fn after_epoch(&mut self, _ctx: &mut CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Get the callback name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A list of callbacks, run in insertion order.
#[derive(Default)]
pub struct CallbackList {
    callbacks: Vec<Box<dyn Callback>>,
}

impl CallbackList {
    /// Create a new empty callback list.
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a callback.
    pub fn add<C: Callback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Names of the registered callbacks.
    pub fn names(&self) -> Vec<&str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }

    /// Call before_fit on all callbacks.
    pub fn before_fit(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.before_fit(ctx)?;
        }
        Ok(())
    }

    /// Call after_fit on all callbacks.
    pub fn after_fit(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.after_fit(ctx)?;
        }
        Ok(())
    }

    /// Call before_epoch on all callbacks.
    pub fn before_epoch(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.before_epoch(ctx)?;
        }
        Ok(())
    }

    /// Call after_epoch on all callbacks.
    pub fn after_epoch(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.after_epoch(ctx)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CallbackList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Callback that logs per-epoch progress through `tracing`.
#[derive(Debug, Default)]
pub struct ProgressCallback;

impl ProgressCallback {
    /// Create a new progress callback.
    pub fn new() -> Self {
        Self
    }
}

impl Callback for ProgressCallback {
    fn before_fit(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        tracing::info!(
            "Starting training for up to {} epochs ({} batches per epoch)",
            ctx.n_epochs,
            ctx.n_batches
        );
        Ok(())
    }

    fn after_epoch(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        let train_loss = ctx.train_loss.map(|l| format!("{:.6}", l)).unwrap_or_default();
        let valid_loss = ctx
            .valid_loss
            .map(|l| format!("{:.6}", l))
            .unwrap_or_else(|| "-".to_string());

        tracing::info!(
            "Epoch {}/{}: train_loss={}, valid_loss={}",
            ctx.epoch + 1,
            ctx.n_epochs,
            train_loss,
            valid_loss
        );
        Ok(())
    }

    fn after_fit(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        if ctx.stop_training {
            tracing::info!("Training stopped early at epoch {}", ctx.epoch + 1);
        } else {
            tracing::info!("Training completed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ProgressCallback"
    }
}

/// Early stopping on the monitored loss.
///
/// Training stops once the loss has failed to improve on the best value by
/// more than `min_delta` for `patience` consecutive epochs.
#[derive(Debug, Clone)]
pub struct EarlyStoppingCallback {
    patience: usize,
    min_delta: f32,
    best_loss: f32,
    counter: usize,
}

impl EarlyStoppingCallback {
    /// Create a new early stopping callback.
    pub fn new(patience: usize, min_delta: f32) -> Self {
        Self {
            patience,
            min_delta,
            best_loss: f32::INFINITY,
            counter: 0,
        }
    }

    /// Epochs since the last improvement.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Best loss seen so far.
    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }
}

impl Callback for EarlyStoppingCallback {
    fn before_fit(&mut self, _ctx: &mut CallbackContext) -> Result<()> {
        self.best_loss = f32::INFINITY;
        self.counter = 0;
        Ok(())
    }

    fn after_epoch(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        let current = ctx.monitored_loss().unwrap_or(f32::INFINITY);

        if current < self.best_loss - self.min_delta {
            self.best_loss = current;
            self.counter = 0;
        } else {
            self.counter += 1;
            if self.counter >= self.patience {
                tracing::info!(
                    epoch = ctx.epoch + 1,
                    best_loss = self.best_loss,
                    "Early stopping triggered after {} epochs without improvement",
                    self.patience
                );
                ctx.stop_training = true;
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "EarlyStoppingCallback"
    }
}

/// Callback that records per-epoch losses into a [`TrainingHistory`].
#[derive(Debug, Default)]
pub struct HistoryCallback {
    history: TrainingHistory,
}

impl HistoryCallback {
    /// Create a new history callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// The history recorded so far.
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Consume the callback and return the recorded history.
    pub fn into_history(self) -> TrainingHistory {
        self.history
    }
}

impl Callback for HistoryCallback {
    fn before_fit(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        self.history = TrainingHistory::with_capacity(ctx.n_epochs);
        Ok(())
    }

    fn after_epoch(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        let train_loss = ctx.train_loss.ok_or_else(|| {
            crate::error::TrainError::CallbackError(format!(
                "epoch {} finished without a training loss",
                ctx.epoch
            ))
        })?;
        self.history.record_epoch(train_loss, ctx.valid_loss);
        Ok(())
    }

    fn after_fit(&mut self, ctx: &mut CallbackContext) -> Result<()> {
        self.history.stopped_early = ctx.stop_training;
        Ok(())
    }

    fn name(&self) -> &str {
        "HistoryCallback"
    }
}
