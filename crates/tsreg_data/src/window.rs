//! Sliding-window generation of supervised training pairs.
//!
//! A sequence is cut into windows of `history_len + horizon_len`
//! observations. Consecutive windows start `horizon_len` apart, so targets
//! never overlap while histories do whenever `horizon_len < history_len`.
//! A trailing remainder shorter than a full window is dropped.
//!
//! ```text
//! history_len = 4, horizon_len = 1
//!
//! sequence: 1 2 3 4 5 6 7
//!           [1 2 3 4|5]
//!             [2 3 4 5|6]
//!               [3 4 5 6|7]
//! ```
//!
//! # Example
//!
//! ```rust
//! use tsreg_data::generate_pairs;
//!
//! let seq = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let pairs: Vec<_> = generate_pairs(&seq, 2, 2)?.collect();
//!
//! assert_eq!(pairs.len(), 2);
//! assert_eq!(pairs[0].input, &[1.0, 2.0]);
//! assert_eq!(pairs[0].target, &[3.0, 4.0]);
//! assert_eq!(pairs[1].input, &[3.0, 4.0]);
//! assert_eq!(pairs[1].target, &[5.0, 6.0]);
//! # Ok::<(), tsreg_data::DataError>(())
//! ```

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// One supervised `(input, target)` pair borrowed from a sequence.
///
/// Both halves are contiguous sub-slices of the same window; the pair never
/// owns data and is cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPair<'a> {
    /// The leading `history_len` observations.
    pub input: &'a [f32],
    /// The trailing `horizon_len` observations.
    pub target: &'a [f32],
}

impl<'a> WindowPair<'a> {
    /// Copy the pair into owned vectors.
    #[must_use]
    pub fn to_owned_pair(&self) -> (Vec<f32>, Vec<f32>) {
        (self.input.to_vec(), self.target.to_vec())
    }
}

/// Window geometry: how many observations go into the input and the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGenerator {
    history_len: usize,
    horizon_len: usize,
}

impl WindowGenerator {
    /// Create a generator.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if either length is zero.
    pub fn new(history_len: usize, horizon_len: usize) -> Result<Self> {
        if history_len == 0 {
            return Err(DataError::InvalidParameter(
                "history_len must be greater than 0".to_string(),
            ));
        }
        if horizon_len == 0 {
            return Err(DataError::InvalidParameter(
                "horizon_len must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            history_len,
            horizon_len,
        })
    }

    /// Number of input observations per pair.
    #[must_use]
    pub const fn history_len(&self) -> usize {
        self.history_len
    }

    /// Number of target observations per pair.
    #[must_use]
    pub const fn horizon_len(&self) -> usize {
        self.horizon_len
    }

    /// Full window length.
    #[must_use]
    pub const fn window_len(&self) -> usize {
        self.history_len + self.horizon_len
    }

    /// Number of pairs a sequence of `seq_len` observations yields.
    #[must_use]
    pub const fn count(&self, seq_len: usize) -> usize {
        if seq_len < self.window_len() {
            0
        } else {
            (seq_len - self.window_len()) / self.horizon_len + 1
        }
    }

    /// Lazily iterate over the pairs of `sequence`.
    #[must_use]
    pub fn pairs<'a>(&self, sequence: &'a [f32]) -> Windows<'a> {
        Windows {
            sequence,
            history_len: self.history_len,
            horizon_len: self.horizon_len,
            offset: 0,
        }
    }
}

/// Lazily iterate over the `(input, target)` pairs of `sequence`.
///
/// A sequence shorter than `history_len + horizon_len` yields no pairs.
///
/// # Errors
///
/// Returns [`DataError::InvalidParameter`] if either length is zero.
pub fn generate_pairs(
    sequence: &[f32],
    history_len: usize,
    horizon_len: usize,
) -> Result<Windows<'_>> {
    Ok(WindowGenerator::new(history_len, horizon_len)?.pairs(sequence))
}

/// Iterator over the windows of a sequence. Created by
/// [`WindowGenerator::pairs`] and [`generate_pairs`].
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    sequence: &'a [f32],
    history_len: usize,
    horizon_len: usize,
    offset: usize,
}

impl<'a> Windows<'a> {
    fn remaining(&self) -> usize {
        let window_len = self.history_len + self.horizon_len;
        let rest = self.sequence.len().saturating_sub(self.offset);
        if rest < window_len {
            0
        } else {
            (rest - window_len) / self.horizon_len + 1
        }
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = WindowPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.offset + self.history_len + self.horizon_len;
        let window = self.sequence.get(self.offset..end)?;
        let (input, target) = window.split_at(self.history_len);
        self.offset += self.horizon_len;
        Some(WindowPair { input, target })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Windows<'_> {}

impl FusedIterator for Windows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(seq: &[f32], history: usize, horizon: usize) -> Vec<(Vec<f32>, Vec<f32>)> {
        generate_pairs(seq, history, horizon)
            .unwrap()
            .map(|p| p.to_owned_pair())
            .collect()
    }

    #[test]
    fn test_exact_window_yields_one_pair() {
        let seq = [0.5, 1.5, 2.5, 3.5, 4.5];
        let pairs = collect(&seq, 3, 2);
        assert_eq!(pairs, vec![(vec![0.5, 1.5, 2.5], vec![3.5, 4.5])]);
    }

    #[test]
    fn test_short_sequence_yields_nothing() {
        let seq = [1.0, 2.0, 3.0, 4.0];
        assert!(collect(&seq, 4, 1).is_empty());
        assert!(collect(&[], 1, 1).is_empty());
    }

    #[test]
    fn test_step_equals_horizon() {
        let seq = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let pairs = collect(&seq, 4, 1);
        assert_eq!(
            pairs,
            vec![
                (vec![1.0, 2.0, 3.0, 4.0], vec![5.0]),
                (vec![2.0, 3.0, 4.0, 5.0], vec![6.0]),
                (vec![3.0, 4.0, 5.0, 6.0], vec![7.0]),
            ]
        );
    }

    #[test]
    fn test_equal_history_and_horizon() {
        let seq = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let pairs = collect(&seq, 2, 2);
        assert_eq!(
            pairs,
            vec![(vec![1.0, 2.0], vec![3.0, 4.0]), (vec![3.0, 4.0], vec![5.0, 6.0])]
        );
    }

    #[test]
    fn test_remainder_is_dropped() {
        let seq = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let pairs = collect(&seq, 2, 2);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.last().unwrap().1, vec![5.0, 6.0]);
    }

    #[test]
    fn test_horizon_longer_than_history_skips_observations() {
        let seq: Vec<f32> = (0..10).map(|v| v as f32).collect();
        let pairs = collect(&seq, 1, 3);
        assert_eq!(
            pairs,
            vec![
                (vec![0.0], vec![1.0, 2.0, 3.0]),
                (vec![3.0], vec![4.0, 5.0, 6.0]),
                (vec![6.0], vec![7.0, 8.0, 9.0]),
            ]
        );
    }

    #[test]
    fn test_zero_lengths_rejected() {
        assert!(matches!(
            generate_pairs(&[1.0, 2.0], 0, 1),
            Err(DataError::InvalidParameter(_))
        ));
        assert!(matches!(
            WindowGenerator::new(3, 0),
            Err(DataError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_count_matches_iteration() {
        let seq: Vec<f32> = (0..57).map(|v| v as f32).collect();
        for history in 1..8 {
            for horizon in 1..6 {
                let generator = WindowGenerator::new(history, horizon).unwrap();
                let iter = generator.pairs(&seq);
                assert_eq!(iter.len(), generator.count(seq.len()));
                assert_eq!(iter.count(), generator.count(seq.len()));
            }
        }
    }

    #[test]
    fn test_size_hint_shrinks() {
        let seq = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mut iter = generate_pairs(&seq, 4, 1).unwrap();
        assert_eq!(iter.len(), 3);
        iter.next();
        assert_eq!(iter.len(), 2);
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
    }
}
