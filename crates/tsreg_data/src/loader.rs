//! Window dataloader: windowing, shuffling and batching for one split.

use burn::prelude::*;

use crate::batch::WindowBatch;
use crate::error::{DataError, Result};
use crate::shuffle::WindowStreamExt;
use crate::window::WindowGenerator;
use tsreg_core::{Seed, Split};

/// Default number of pairs held by the shuffle reservoir.
pub const DEFAULT_SHUFFLE_BUFFER: usize = 2000;

/// Default number of pairs per batch.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// A dataloader that produces batches of window pairs from a borrowed
/// sequence.
///
/// Each epoch regenerates the windows lazily, passes them through a bounded
/// shuffle reservoir and groups them into batches. Only the reservoir and
/// the current batch are held in memory.
///
/// # Example
///
/// ```rust
/// use tsreg_data::{WindowDataLoader, WindowGenerator};
/// use tsreg_core::Seed;
///
/// let series: Vec<f32> = (0..100).map(|v| v as f32).collect();
/// let loader = WindowDataLoader::builder(&series, WindowGenerator::new(4, 1)?)
///     .batch_size(16)
///     .shuffle_buffer(Some(64))
///     .seed(Seed::new(42))
///     .build()?;
///
/// assert_eq!(loader.n_pairs(), 96);
/// assert_eq!(loader.n_batches(), 6);
/// for batch in loader.iter_epoch(0) {
///     let batch = batch?;
///     assert!(batch.len() <= 16);
/// }
/// # Ok::<(), tsreg_data::DataError>(())
/// ```
#[derive(Debug, Clone)]
pub struct WindowDataLoader<'a> {
    sequence: &'a [f32],
    generator: WindowGenerator,
    batch_size: usize,
    shuffle_buffer: Option<usize>,
    seed: Seed,
    split: Split,
}

impl<'a> WindowDataLoader<'a> {
    /// Create a new dataloader builder.
    #[must_use]
    pub fn builder(sequence: &'a [f32], generator: WindowGenerator) -> WindowDataLoaderBuilder<'a> {
        WindowDataLoaderBuilder::new(sequence, generator)
    }

    /// The window geometry.
    #[must_use]
    pub fn generator(&self) -> WindowGenerator {
        self.generator
    }

    /// Get the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Get the data split type.
    #[must_use]
    pub fn split(&self) -> Split {
        self.split
    }

    /// Number of pairs per epoch.
    #[must_use]
    pub fn n_pairs(&self) -> usize {
        self.generator.count(self.sequence.len())
    }

    /// Number of batches per epoch, counting a short final batch.
    #[must_use]
    pub fn n_batches(&self) -> usize {
        self.n_pairs().div_ceil(self.batch_size)
    }

    /// Check if the split yields no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_pairs() == 0
    }

    /// Iterate over the batches of one epoch.
    ///
    /// The shuffle stream is seeded with `seed.derive("epoch-{epoch}")`, so
    /// each epoch sees a different order while the run stays reproducible.
    pub fn iter_epoch(&self, epoch: usize) -> Box<dyn Iterator<Item = Result<WindowBatch>> + 'a> {
        let pairs = self.generator.pairs(self.sequence);
        let batch_size = self.batch_size;

        match self.shuffle_buffer {
            Some(buffer_size) => {
                let seed = self.seed.derive(&format!("epoch-{epoch}"));
                Box::new(
                    pairs
                        .shuffled(buffer_size, seed)
                        .batched(batch_size)
                        .map(|chunk| WindowBatch::from_pairs(&chunk).map_err(DataError::from)),
                )
            }
            None => Box::new(
                pairs
                    .batched(batch_size)
                    .map(|chunk| WindowBatch::from_pairs(&chunk).map_err(DataError::from)),
            ),
        }
    }

    /// Iterate over the batches of one epoch as tensors.
    ///
    /// # Type Parameters
    ///
    /// * `B` - The Burn backend to use for tensors
    pub fn iter<B: Backend>(
        &self,
        epoch: usize,
        device: &B::Device,
    ) -> impl Iterator<Item = Result<(Tensor<B, 2>, Tensor<B, 2>)>> + 'a {
        let device = device.clone();
        self.iter_epoch(epoch)
            .map(move |batch| batch.map(|b| b.into_tensors::<B>(&device)))
    }
}

/// Builder for [`WindowDataLoader`].
#[derive(Debug, Clone)]
pub struct WindowDataLoaderBuilder<'a> {
    sequence: &'a [f32],
    generator: WindowGenerator,
    batch_size: usize,
    shuffle_buffer: Option<usize>,
    seed: Seed,
    split: Split,
}

impl<'a> WindowDataLoaderBuilder<'a> {
    /// Create a new builder with the default batch size and shuffle buffer.
    #[must_use]
    pub fn new(sequence: &'a [f32], generator: WindowGenerator) -> Self {
        Self {
            sequence,
            generator,
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle_buffer: Some(DEFAULT_SHUFFLE_BUFFER),
            seed: Seed::default(),
            split: Split::Train,
        }
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the shuffle reservoir size; `None` keeps chronological order.
    #[must_use]
    pub fn shuffle_buffer(mut self, shuffle_buffer: Option<usize>) -> Self {
        self.shuffle_buffer = shuffle_buffer;
        self
    }

    /// Set the random seed for shuffling.
    #[must_use]
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Set the data split type.
    #[must_use]
    pub fn split(mut self, split: Split) -> Self {
        self.split = split;
        self
    }

    /// Build the dataloader.
    ///
    /// A split that yields no pairs is accepted; callers decide whether that
    /// is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch size or the shuffle buffer is zero.
    pub fn build(self) -> Result<WindowDataLoader<'a>> {
        if self.batch_size == 0 {
            return Err(DataError::InvalidBatchSize(
                "Batch size must be greater than 0".to_string(),
            ));
        }
        if self.shuffle_buffer == Some(0) {
            return Err(DataError::InvalidParameter(
                "Shuffle buffer must be greater than 0".to_string(),
            ));
        }

        let loader = WindowDataLoader {
            sequence: self.sequence,
            generator: self.generator,
            batch_size: self.batch_size,
            shuffle_buffer: self.shuffle_buffer,
            seed: self.seed,
            split: self.split,
        };

        if loader.is_empty() {
            tracing::warn!(
                split = %loader.split,
                seq_len = self.sequence.len(),
                window_len = self.generator.window_len(),
                "sequence is shorter than one window; split yields no pairs"
            );
        }

        Ok(loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    fn series(n: usize) -> Vec<f32> {
        (0..n).map(|v| v as f32).collect()
    }

    #[test]
    fn test_unshuffled_batches_are_chronological() {
        let seq = series(10);
        let loader = WindowDataLoader::builder(&seq, WindowGenerator::new(3, 1).unwrap())
            .batch_size(4)
            .shuffle_buffer(None)
            .build()
            .unwrap();

        let batches: Vec<_> = loader.iter_epoch(0).map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 4);
        assert_eq!(batches[1].len(), 3);
        assert_eq!(batches[0].input(0), &[0.0, 1.0, 2.0]);
        assert_eq!(batches[1].target(2), &[9.0]);
    }

    #[test]
    fn test_epochs_reshuffle_reproducibly() {
        let seq = series(200);
        let loader = WindowDataLoader::builder(&seq, WindowGenerator::new(4, 1).unwrap())
            .batch_size(8)
            .shuffle_buffer(Some(50))
            .seed(Seed::new(7))
            .build()
            .unwrap();

        let order = |epoch: usize| -> Vec<f32> {
            loader
                .iter_epoch(epoch)
                .flat_map(|b| b.unwrap().targets)
                .collect()
        };

        let e0 = order(0);
        assert_eq!(e0, order(0));
        assert_ne!(e0, order(1));

        let mut sorted = e0.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, (4..200).map(|v| v as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_counts() {
        let seq = series(100);
        let loader = WindowDataLoader::builder(&seq, WindowGenerator::new(4, 1).unwrap())
            .batch_size(32)
            .build()
            .unwrap();
        assert_eq!(loader.n_pairs(), 96);
        assert_eq!(loader.n_batches(), 3);
        assert_eq!(loader.iter_epoch(0).count(), 3);
    }

    #[test]
    fn test_short_sequence_is_empty_not_error() {
        let seq = series(3);
        let loader = WindowDataLoader::builder(&seq, WindowGenerator::new(4, 1).unwrap())
            .split(Split::Valid)
            .build()
            .unwrap();
        assert!(loader.is_empty());
        assert_eq!(loader.n_batches(), 0);
        assert_eq!(loader.iter_epoch(0).count(), 0);
    }

    #[test]
    fn test_invalid_config() {
        let seq = series(10);
        let generator = WindowGenerator::new(2, 1).unwrap();
        assert!(matches!(
            WindowDataLoader::builder(&seq, generator).batch_size(0).build(),
            Err(DataError::InvalidBatchSize(_))
        ));
        assert!(matches!(
            WindowDataLoader::builder(&seq, generator).shuffle_buffer(Some(0)).build(),
            Err(DataError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_tensor_iteration() {
        let seq = series(20);
        let loader = WindowDataLoader::builder(&seq, WindowGenerator::new(5, 2).unwrap())
            .batch_size(3)
            .build()
            .unwrap();
        let device = Default::default();
        let shapes: Vec<_> = loader
            .iter::<NdArray>(0, &device)
            .map(|r| {
                let (x, y) = r.unwrap();
                (x.dims(), y.dims())
            })
            .collect();
        // (20 - 7) / 2 + 1 = 7 pairs -> 3 + 3 + 1
        assert_eq!(shapes, vec![([3, 5], [3, 2]), ([3, 5], [3, 2]), ([1, 5], [1, 2])]);
    }
}
