//! # tsreg_data
//!
//! Windowing and data loading for tsreg window regression forecasting.
//!
//! This crate provides:
//! - [`WindowGenerator`] / [`generate_pairs`] for slicing a series into
//!   supervised `(input, target)` pairs
//! - [`ShuffleBuffer`] and [`Batches`] iterator adapters for bounded
//!   streaming shuffle and batching
//! - [`WindowDataLoader`] for per-epoch batched iteration with tensors
//! - I/O utilities for NPY and (with `polars-io`) CSV series
//!
//! ## Example
//!
//! ```rust
//! use tsreg_data::{split_series, WindowDataLoader, WindowGenerator};
//! use tsreg_core::{Seed, Split};
//!
//! let series: Vec<f32> = (0..500).map(|t| (t as f32 * 0.1).sin()).collect();
//! let (train, valid) = split_series(&series, 0.2)?;
//!
//! let generator = WindowGenerator::new(4, 1)?;
//! let train_dl = WindowDataLoader::builder(train, generator)
//!     .batch_size(32)
//!     .seed(Seed::new(42))
//!     .build()?;
//! let valid_dl = WindowDataLoader::builder(valid, generator)
//!     .split(Split::Valid)
//!     .build()?;
//!
//! assert_eq!(train_dl.n_pairs(), 396);
//! assert_eq!(valid_dl.n_pairs(), 96);
//! # Ok::<(), tsreg_data::DataError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod batch;
mod error;
mod io;
mod loader;
mod shuffle;
mod window;

pub use batch::WindowBatch;
pub use error::{DataError, Result};
#[cfg(feature = "polars-io")]
pub use io::read_csv_series;
pub use io::{read_npy_series, split_series};
pub use loader::{
    WindowDataLoader, WindowDataLoaderBuilder, DEFAULT_BATCH_SIZE, DEFAULT_SHUFFLE_BUFFER,
};
pub use shuffle::{Batches, ShuffleBuffer, WindowStreamExt};
pub use window::{generate_pairs, WindowGenerator, WindowPair, Windows};
