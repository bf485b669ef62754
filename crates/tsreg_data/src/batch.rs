//! Owned batches of window pairs and their tensor form.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::window::WindowPair;
use tsreg_core::CoreError;

/// A row-major batch of `(input, target)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBatch {
    /// Flattened inputs, `len * history_len` values.
    pub inputs: Vec<f32>,
    /// Flattened targets, `len * horizon_len` values.
    pub targets: Vec<f32>,
    len: usize,
    history_len: usize,
    horizon_len: usize,
}

impl WindowBatch {
    /// Copy a slice of pairs into a batch.
    ///
    /// All pairs must share the same geometry, which holds for pairs coming
    /// from one [`WindowGenerator`](crate::WindowGenerator).
    pub fn from_pairs(pairs: &[WindowPair<'_>]) -> Result<Self, CoreError> {
        let history_len = pairs.first().map_or(0, |p| p.input.len());
        let horizon_len = pairs.first().map_or(0, |p| p.target.len());

        let mut inputs = Vec::with_capacity(pairs.len() * history_len);
        let mut targets = Vec::with_capacity(pairs.len() * horizon_len);
        for pair in pairs {
            if pair.input.len() != history_len {
                return Err(CoreError::ShapeMismatch {
                    expected: history_len,
                    got: pair.input.len(),
                });
            }
            if pair.target.len() != horizon_len {
                return Err(CoreError::ShapeMismatch {
                    expected: horizon_len,
                    got: pair.target.len(),
                });
            }
            inputs.extend_from_slice(pair.input);
            targets.extend_from_slice(pair.target);
        }

        Ok(Self {
            inputs,
            targets,
            len: pairs.len(),
            history_len,
            horizon_len,
        })
    }

    /// Number of pairs in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the batch holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Input width.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Target width.
    #[must_use]
    pub fn horizon_len(&self) -> usize {
        self.horizon_len
    }

    /// Input row `i`.
    #[must_use]
    pub fn input(&self, i: usize) -> &[f32] {
        &self.inputs[i * self.history_len..(i + 1) * self.history_len]
    }

    /// Target row `i`.
    #[must_use]
    pub fn target(&self, i: usize) -> &[f32] {
        &self.targets[i * self.horizon_len..(i + 1) * self.horizon_len]
    }

    /// Convert into `(inputs, targets)` tensors of shape
    /// `(len, history_len)` and `(len, horizon_len)`.
    pub fn into_tensors<B: Backend>(self, device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = TensorData::new(self.inputs, [self.len, self.history_len]);
        let y = TensorData::new(self.targets, [self.len, self.horizon_len]);
        (Tensor::from_data(x, device), Tensor::from_data(y, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::generate_pairs;
    use burn_ndarray::NdArray;

    #[test]
    fn test_from_pairs_layout() {
        let seq = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let pairs: Vec<_> = generate_pairs(&seq, 2, 1).unwrap().collect();
        let batch = WindowBatch::from_pairs(&pairs).unwrap();

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.inputs, vec![1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0]);
        assert_eq!(batch.targets, vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(batch.input(2), &[3.0, 4.0]);
        assert_eq!(batch.target(3), &[6.0]);
    }

    #[test]
    fn test_mixed_geometry_rejected() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 2.0, 3.0, 4.0];
        let pairs = vec![
            WindowPair { input: &a[..2], target: &a[2..] },
            WindowPair { input: &b[..3], target: &b[3..] },
        ];
        assert!(matches!(
            WindowBatch::from_pairs(&pairs),
            Err(CoreError::ShapeMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_into_tensors_shapes() {
        let seq: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let pairs: Vec<_> = generate_pairs(&seq, 4, 2).unwrap().collect();
        let batch = WindowBatch::from_pairs(&pairs).unwrap();
        let device = Default::default();
        let (x, y) = batch.into_tensors::<NdArray>(&device);

        assert_eq!(x.dims(), [4, 4]);
        assert_eq!(y.dims(), [4, 2]);
        let y_values = y.into_data().to_vec::<f32>().unwrap();
        assert_eq!(y_values, vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }
}
