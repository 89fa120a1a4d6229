//! # Trade Math
//!
//! Numeric building blocks for price-series features.
//! This crate provides rolling means and simple returns over closing prices,
//! shared by the feature builder and the autoregressive forecaster.

use thiserror::Error;

pub mod moving_averages;
pub mod returns;

pub use moving_averages::{trailing_mean, SimpleMovingAverage};
pub use returns::simple_return;

/// Errors that can occur in trading-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
