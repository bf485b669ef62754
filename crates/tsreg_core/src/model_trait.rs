//! Model traits for training.
//!
//! Defines the trait forecasters implement to work with the training system.

use burn::prelude::*;

/// Trait for window forecasting models.
///
/// A forecaster maps a batch of history windows to a batch of horizon
/// windows. Input and output widths are fixed by the model configuration.
///
/// The trainer needs the trait on both the autodiff module and its inner
/// (validation) module, so implement it for every backend.
pub trait TSForecastingModel<B: Backend>: Module<B> {
    /// Forward pass returning forecasts.
    ///
    /// # Arguments
    ///
    /// * `x` - Input tensor of shape (batch, history_len)
    ///
    /// # Returns
    ///
    /// Forecasts tensor of shape (batch, horizon_len)
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Number of observations the model consumes per window.
    fn history_len(&self) -> usize;

    /// Number of observations the model predicts per window.
    fn horizon_len(&self) -> usize;
}
