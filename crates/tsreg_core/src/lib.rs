//! # tsreg_core
//!
//! Core types and traits for tsreg window regression forecasting.
//!
//! This crate provides:
//! - [`Seed`] for deterministic random number generation
//! - [`Split`] to tag the role of a data stream (train/valid)
//! - [`TSForecastingModel`], the trait trainable forecasters implement
//! - [`CoreError`] for shape mismatches
//!
//! ## Shape Convention
//!
//! Windowed data follows the convention `(B, L)`:
//! - `B`: Batch size (number of windows)
//! - `L`: Window length (history length for inputs, horizon length for targets)
//!
//! ## Example
//!
//! ```rust
//! use tsreg_core::{Seed, Split};
//!
//! let seed = Seed::new(42);
//! let epoch_seed = seed.derive("epoch-0");
//! assert_ne!(seed, epoch_seed);
//! assert_eq!(Split::default(), Split::Train);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod model_trait;
mod seed;
mod split;

pub use error::{CoreError, Result};
pub use model_trait::TSForecastingModel;
pub use seed::Seed;
pub use split::Split;
