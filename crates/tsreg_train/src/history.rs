//! Per-epoch training history.

use serde::{Deserialize, Serialize};

/// Losses recorded during one training run.
///
/// Mean squared error is the only metric, so the recorded losses double as
/// the metric history. When the validation split is empty, `valid_losses`
/// stays empty and the best epoch is tracked on the training loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Mean training loss per epoch.
    pub train_losses: Vec<f32>,
    /// Mean validation loss per epoch.
    pub valid_losses: Vec<f32>,
    /// Epoch (0-indexed) with the lowest monitored loss.
    pub best_epoch: Option<usize>,
    /// Lowest monitored loss.
    pub best_loss: Option<f32>,
    /// Whether early stopping ended the run.
    pub stopped_early: bool,
}

impl TrainingHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history with room for `n_epochs`.
    pub fn with_capacity(n_epochs: usize) -> Self {
        Self {
            train_losses: Vec::with_capacity(n_epochs),
            valid_losses: Vec::with_capacity(n_epochs),
            ..Self::default()
        }
    }

    /// Append one epoch.
    pub fn record_epoch(&mut self, train_loss: f32, valid_loss: Option<f32>) {
        let epoch = self.train_losses.len();
        self.train_losses.push(train_loss);
        if let Some(loss) = valid_loss {
            self.valid_losses.push(loss);
        }

        let monitored = valid_loss.unwrap_or(train_loss);
        if self.best_loss.map_or(true, |best| monitored < best) {
            self.best_loss = Some(monitored);
            self.best_epoch = Some(epoch);
        }
    }

    /// Number of completed epochs.
    pub fn epochs_run(&self) -> usize {
        self.train_losses.len()
    }

    /// Whether the history tracks validation losses.
    pub fn has_validation(&self) -> bool {
        !self.valid_losses.is_empty()
    }

    /// Loss of the last epoch, validation if available.
    pub fn last_loss(&self) -> Option<f32> {
        self.valid_losses
            .last()
            .or_else(|| self.train_losses.last())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_epoch_tracks_validation() {
        let mut history = TrainingHistory::new();
        history.record_epoch(1.0, Some(0.9));
        history.record_epoch(0.5, Some(0.4));
        history.record_epoch(0.3, Some(0.6));

        assert_eq!(history.epochs_run(), 3);
        assert_eq!(history.best_epoch, Some(1));
        assert_eq!(history.best_loss, Some(0.4));
        assert_eq!(history.last_loss(), Some(0.6));
        assert!(history.has_validation());
    }

    #[test]
    fn test_best_epoch_without_validation() {
        let mut history = TrainingHistory::new();
        history.record_epoch(2.0, None);
        history.record_epoch(1.0, None);
        assert!(!history.has_validation());
        assert_eq!(history.best_epoch, Some(1));
        assert_eq!(history.last_loss(), Some(1.0));
    }

    #[test]
    fn test_json_shape() {
        let mut history = TrainingHistory::new();
        history.record_epoch(0.25, Some(0.5));
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["train_losses"][0], 0.25);
        assert_eq!(json["best_epoch"], 0);
        assert_eq!(json["stopped_early"], false);
    }
}
