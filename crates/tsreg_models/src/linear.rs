//! LinearForecaster: a single dense layer from history window to horizon.
//!
//! The simplest regression baseline for windowed forecasting: every
//! horizon step is an affine function of the `history_len` preceding
//! observations.

use std::fmt::Write as _;

use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use tsreg_core::TSForecastingModel;

/// Configuration for [`LinearForecaster`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearForecasterConfig {
    /// Number of input observations (look-back window).
    pub history_len: usize,
    /// Number of predicted observations (forecast horizon).
    pub horizon_len: usize,
    /// Whether the layer has a bias term.
    pub bias: bool,
}

impl Default for LinearForecasterConfig {
    fn default() -> Self {
        Self {
            history_len: 4,
            horizon_len: 1,
            bias: true,
        }
    }
}

impl LinearForecasterConfig {
    /// Create a new config.
    pub fn new(history_len: usize, horizon_len: usize) -> Self {
        Self {
            history_len,
            horizon_len,
            ..Default::default()
        }
    }

    /// Enable or disable the bias term.
    #[must_use]
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearForecaster<B> {
        LinearForecaster::new(self, device)
    }
}

/// One dense layer mapping `(B, history_len)` to `(B, horizon_len)`.
///
/// # Example
///
/// ```rust
/// use burn::prelude::*;
/// use burn_ndarray::NdArray;
/// use tsreg_models::LinearForecasterConfig;
///
/// let device = Default::default();
/// let model = LinearForecasterConfig::new(4, 2).init::<NdArray>(&device);
///
/// let x = Tensor::<NdArray, 2>::zeros([8, 4], &device);
/// assert_eq!(model.forward(x).dims(), [8, 2]);
/// ```
#[derive(Module, Debug)]
pub struct LinearForecaster<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> LinearForecaster<B> {
    /// Create a new model.
    pub fn new(config: &LinearForecasterConfig, device: &B::Device) -> Self {
        let linear = LinearConfig::new(config.history_len, config.horizon_len)
            .with_bias(config.bias)
            .init(device);
        Self { linear }
    }

    /// Forward pass.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(x)
    }

    /// Input width, read from the weight matrix.
    pub fn history_len(&self) -> usize {
        self.linear.weight.val().dims()[0]
    }

    /// Output width, read from the weight matrix.
    pub fn horizon_len(&self) -> usize {
        self.linear.weight.val().dims()[1]
    }

    /// Whether the layer carries a bias term.
    pub fn has_bias(&self) -> bool {
        self.linear.bias.is_some()
    }

    /// Total number of trainable parameters.
    pub fn n_params(&self) -> usize {
        let bias = if self.has_bias() { self.horizon_len() } else { 0 };
        self.history_len() * self.horizon_len() + bias
    }

    /// Weight matrix values in row-major `(history_len, horizon_len)` order.
    pub fn weights(&self) -> Vec<f32> {
        self.linear
            .weight
            .val()
            .into_data()
            .iter::<f32>()
            .collect()
    }

    /// Bias values, if the layer has a bias.
    pub fn bias(&self) -> Option<Vec<f32>> {
        self.linear
            .bias
            .as_ref()
            .map(|b| b.val().into_data().iter::<f32>().collect())
    }

    /// Human-readable model summary.
    pub fn summary(&self) -> String {
        let history = self.history_len();
        let horizon = self.horizon_len();
        let rule = "_".repeat(64);
        let thick = "=".repeat(64);

        let mut out = String::new();
        let _ = writeln!(out, "Model: \"LinearForecaster\"");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{:<24}{:<24}{:>16}", "Layer (type)", "Output Shape", "Param #");
        let _ = writeln!(out, "{thick}");
        let _ = writeln!(
            out,
            "{:<24}{:<24}{:>16}",
            "linear (Linear)",
            format!("(None, {horizon})"),
            self.n_params()
        );
        let _ = writeln!(out, "{thick}");
        let _ = writeln!(out, "Input shape: (None, {history})");
        let _ = writeln!(out, "Bias: {}", if self.has_bias() { "yes" } else { "no" });
        let _ = writeln!(out, "Total params: {}", self.n_params());
        let _ = writeln!(out, "Trainable params: {}", self.n_params());
        let _ = writeln!(out, "{rule}");
        out
    }
}

impl<B: Backend> TSForecastingModel<B> for LinearForecaster<B> {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(x)
    }

    fn history_len(&self) -> usize {
        self.history_len()
    }

    fn horizon_len(&self) -> usize {
        self.horizon_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_config_default() {
        let config = LinearForecasterConfig::default();
        assert_eq!(config.history_len, 4);
        assert_eq!(config.horizon_len, 1);
        assert!(config.bias);
    }

    #[test]
    fn test_dimensions_follow_config() {
        let device = Default::default();
        let model = LinearForecasterConfig::new(6, 3).init::<TestBackend>(&device);

        assert_eq!(model.history_len(), 6);
        assert_eq!(model.horizon_len(), 3);
        assert_eq!(model.n_params(), 6 * 3 + 3);

        let x = Tensor::<TestBackend, 2>::ones([5, 6], &device);
        assert_eq!(model.forward(x).dims(), [5, 3]);
    }

    #[test]
    fn test_without_bias() {
        let device = Default::default();
        let model = LinearForecasterConfig::new(4, 1)
            .with_bias(false)
            .init::<TestBackend>(&device);
        assert!(!model.has_bias());
        assert!(model.bias().is_none());
        assert_eq!(model.n_params(), 4);
        assert_eq!(model.weights().len(), 4);
    }

    #[test]
    fn test_summary_mentions_shapes() {
        let device = Default::default();
        let model = LinearForecasterConfig::new(4, 2).init::<TestBackend>(&device);
        let summary = model.summary();
        assert!(summary.contains("LinearForecaster"));
        assert!(summary.contains("(None, 2)"));
        assert!(summary.contains("Input shape: (None, 4)"));
        assert!(summary.contains("Total params: 10"));
    }

    #[test]
    fn test_forecasting_trait_on_both_backends() {
        use burn::module::AutodiffModule;
        use burn_autodiff::Autodiff;

        fn widths<B: Backend, M: TSForecastingModel<B>>(model: &M) -> (usize, usize) {
            (model.history_len(), model.horizon_len())
        }

        let device = Default::default();
        let model = LinearForecasterConfig::new(7, 3).init::<Autodiff<NdArray>>(&device);
        assert_eq!(widths(&model), (7, 3));

        let x = Tensor::<Autodiff<NdArray>, 2>::zeros([2, 7], &device);
        assert_eq!(TSForecastingModel::forward(&model, x).dims(), [2, 3]);

        let inner = model.valid();
        assert_eq!(widths(&inner), (7, 3));
    }

    #[test]
    fn test_config_serialization() {
        let config = LinearForecasterConfig::new(8, 2);
        let json = serde_json::to_string(&config).unwrap();
        let restored: LinearForecasterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
