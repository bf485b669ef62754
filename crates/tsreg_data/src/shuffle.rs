//! Bounded streaming shuffle and fixed-size batching.
//!
//! Both are plain iterator adapters, so they work on any item type. The
//! training pipeline applies them to whole [`WindowPair`](crate::WindowPair)s
//! after the window generator has dropped the remainder, which means a
//! pair's input and target are never separated or reordered.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use tsreg_core::Seed;

/// Reservoir shuffle over a bounded buffer.
///
/// The first `buffer_size` items fill the buffer. Each further upstream
/// item replaces a uniformly chosen buffered item, which is emitted. Once
/// upstream is exhausted the buffer drains in random order. Peak memory is
/// `buffer_size` items regardless of stream length.
///
/// A buffer of size 1 preserves the input order. A buffer at least as large
/// as the stream is a full uniform shuffle.
pub struct ShuffleBuffer<I: Iterator> {
    inner: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: ChaCha8Rng,
    filled: bool,
}

impl<I: Iterator> ShuffleBuffer<I> {
    /// Wrap `inner` with a shuffle buffer of `buffer_size` slots.
    ///
    /// A `buffer_size` of 0 is treated as 1.
    pub fn new(inner: I, buffer_size: usize, seed: Seed) -> Self {
        let capacity = buffer_size.max(1);
        Self {
            inner,
            buffer: Vec::with_capacity(capacity),
            capacity,
            rng: seed.to_rng(),
            filled: false,
        }
    }

    fn fill(&mut self) {
        while self.buffer.len() < self.capacity {
            match self.inner.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }
        self.filled = true;
    }
}

impl<I: Iterator> Iterator for ShuffleBuffer<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.filled {
            self.fill();
        }
        if self.buffer.is_empty() {
            return None;
        }

        let idx = self.rng.gen_range(0..self.buffer.len());
        match self.inner.next() {
            Some(incoming) => Some(std::mem::replace(&mut self.buffer[idx], incoming)),
            None => Some(self.buffer.swap_remove(idx)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.inner.size_hint();
        let held = self.buffer.len();
        (lo.saturating_add(held), hi.and_then(|h| h.checked_add(held)))
    }
}

/// Groups items into `Vec`s of `batch_size`; the last batch may be shorter.
pub struct Batches<I: Iterator> {
    inner: I,
    batch_size: usize,
}

impl<I: Iterator> Batches<I> {
    /// Wrap `inner`. A `batch_size` of 0 is treated as 1.
    pub fn new(inner: I, batch_size: usize) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
        }
    }
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.inner.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.inner.size_hint();
        let per = self.batch_size;
        (lo.div_ceil(per), hi.map(|h| h.div_ceil(per)))
    }
}

/// Extension methods adding [`ShuffleBuffer`] and [`Batches`] to iterators.
pub trait WindowStreamExt: Iterator + Sized {
    /// Shuffle through a bounded reservoir.
    fn shuffled(self, buffer_size: usize, seed: Seed) -> ShuffleBuffer<Self> {
        ShuffleBuffer::new(self, buffer_size, seed)
    }

    /// Group into batches.
    fn batched(self, batch_size: usize) -> Batches<Self> {
        Batches::new(self, batch_size)
    }
}

impl<I: Iterator> WindowStreamExt for I {}
