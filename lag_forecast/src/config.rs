//! Validated run configuration

use crate::data::{Interval, Period};
use crate::dataset::DEFAULT_SPLIT_RATIO;
use crate::error::{ForecastError, Result};
use crate::features::FeatureConfig;
use crate::models::RegressorKind;
use crate::report::CurrencyConversion;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Random forest knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    /// Number of trees
    pub n_trees: usize,
    /// Seed for reproducible fits
    pub seed: u64,
    /// Optional depth limit
    pub max_depth: Option<u16>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// Everything one forecast run needs, checked up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Instrument symbol, upper-cased
    pub ticker: String,
    /// History look-back
    pub period: Period,
    /// Bar interval
    pub interval: Interval,
    /// Number of future steps to forecast
    pub horizon: usize,
    /// Feature layout
    pub features: FeatureConfig,
    /// Share of samples used for training
    pub split_ratio: f64,
    /// Display-currency conversion
    pub conversion: CurrencyConversion,
    /// Which regressor to fit
    pub regressor: RegressorKind,
    /// Random forest parameters
    pub forest: ForestSettings,
    /// Deltas within this distance of zero are reported as no change
    pub no_change_tolerance: f64,
    /// Give up on retrieval after this many seconds (0 disables)
    pub fetch_timeout_secs: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            period: Period::TwoYears,
            interval: Interval::Daily,
            horizon: 3,
            features: FeatureConfig::default(),
            split_ratio: DEFAULT_SPLIT_RATIO,
            conversion: CurrencyConversion::default(),
            regressor: RegressorKind::RandomForest,
            forest: ForestSettings::default(),
            no_change_tolerance: 0.0,
            fetch_timeout_secs: 30,
        }
    }
}

impl ForecastConfig {
    /// Defaults for `ticker`
    pub fn for_ticker(ticker: &str) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text)?;
        config.ticker = config.ticker.trim().to_uppercase();
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject any malformed field
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(ForecastError::ValidationError(
                "Ticker cannot be empty".to_string(),
            ));
        }
        if self
            .ticker
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        {
            return Err(ForecastError::ValidationError(format!(
                "Ticker '{}' contains unsupported characters",
                self.ticker
            )));
        }
        if self.horizon == 0 {
            return Err(ForecastError::ValidationError(
                "Horizon must be at least 1 day".to_string(),
            ));
        }
        self.features.validate()?;
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ForecastError::ValidationError(format!(
                "Split ratio must be strictly between 0 and 1, got {}",
                self.split_ratio
            )));
        }
        self.conversion.validate()?;
        if self.forest.n_trees == 0 {
            return Err(ForecastError::ValidationError(
                "Random forest needs at least one tree".to_string(),
            ));
        }
        if self.forest.min_samples_split < 2 {
            return Err(ForecastError::ValidationError(format!(
                "min_samples_split must be at least 2, got {}",
                self.forest.min_samples_split
            )));
        }
        if self.no_change_tolerance.is_nan() || self.no_change_tolerance < 0.0 {
            return Err(ForecastError::ValidationError(format!(
                "No-change tolerance must be non-negative, got {}",
                self.no_change_tolerance
            )));
        }
        Ok(())
    }
}
