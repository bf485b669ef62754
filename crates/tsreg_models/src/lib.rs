//! # tsreg_models
//!
//! Forecasting models for tsreg.
//!
//! Currently a single architecture:
//!
//! - [`LinearForecaster`]: one dense layer from a `history_len` window to a
//!   `horizon_len` forecast
//!
//! plus [`checkpoint`] helpers for persisting module parameters.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod linear;

pub use checkpoint::{CheckpointError, ModelCheckpoint};
pub use linear::{LinearForecaster, LinearForecasterConfig};
