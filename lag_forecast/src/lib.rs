//! # Lag Forecast
//!
//! Short-horizon price forecasting from daily closes with a supervised regressor.
//!
//! ## Features
//!
//! - Price history from Yahoo Finance, CSV files, or memory
//! - Lag, one-step return and rolling-mean features with no look-ahead
//! - Chronological train/evaluation split
//! - Random forest and linear regressors behind one trait
//! - Autoregressive multi-day forecasting that feeds predictions back as inputs
//! - Profit/loss report in two currencies
//!
//! ## Quick Start
//!
//! ```no_run
//! use lag_forecast::{ForecastConfig, Pipeline, YahooPriceSource};
//!
//! # async fn run() -> lag_forecast::Result<()> {
//! let mut config = ForecastConfig::for_ticker("AAPL");
//! config.horizon = 5;
//!
//! let pipeline = Pipeline::new(config)?;
//! let outcome = pipeline.run(&YahooPriceSource::new()?).await?;
//!
//! println!("{}", outcome.metrics);
//! println!("{}", outcome.report);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod source;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{DataLoader, Interval, Period, PriceBar, PriceSeries};
pub use crate::dataset::{assemble, Dataset, Sample};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{build_features, FeatureConfig, FeatureSchema, FeatureVector};
pub use crate::forecaster::{forecast, ForecastPath, Forecaster};
pub use crate::metrics::{evaluate, EvaluationMetrics};
pub use crate::models::{FittedRegressor, Regressor, RegressorKind};
pub use crate::pipeline::{Pipeline, PipelineOutcome};
pub use crate::report::{CurrencyConversion, ForecastReport, Outcome};
pub use crate::source::{CsvPriceSource, InMemoryPriceSource, PriceSource, YahooPriceSource};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
