//! Lag, return and rolling-mean features over closing prices
//!
//! A row is emitted for time step `t` once `t >= max(n_lags, max window)`.
//! Its fields are, in order:
//!
//! - `lag_1 .. lag_n`: close at `t-1 .. t-n`
//! - `return_1`: `(close[t] - close[t-1]) / close[t-1]`
//! - `ma_w`: mean of the `w` closes ending at `t` (inclusive), windows ascending
//!
//! Every value is computed from closes at or before `t`, so pairing the row with
//! `close[t+1]` never leaks the target.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use trade_math::{simple_return, trailing_mean, SimpleMovingAverage};

/// Name of the one-step return field
pub const RETURN_FIELD: &str = "return_1";

/// Parameters that define the feature layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of lag features
    pub n_lags: usize,
    /// Rolling-mean window lengths
    pub ma_windows: BTreeSet<usize>,
}

impl FeatureConfig {
    /// Create a validated feature configuration
    pub fn new(n_lags: usize, ma_windows: impl IntoIterator<Item = usize>) -> Result<Self> {
        let config = Self {
            n_lags,
            ma_windows: ma_windows.into_iter().collect(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check lag count and windows
    pub fn validate(&self) -> Result<()> {
        if self.n_lags == 0 {
            return Err(ForecastError::ValidationError(
                "n_lags must be at least 1".to_string(),
            ));
        }
        if self.ma_windows.contains(&0) {
            return Err(ForecastError::ValidationError(
                "Moving-average windows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Largest moving-average window, or 0 when none are configured
    pub fn max_window(&self) -> usize {
        self.ma_windows.iter().next_back().copied().unwrap_or(0)
    }

    /// First time step index that can carry a feature row
    pub fn warmup(&self) -> usize {
        self.n_lags.max(self.max_window())
    }

    /// Ordered field names for this configuration
    pub fn schema(&self) -> FeatureSchema {
        let mut fields: Vec<String> = (1..=self.n_lags).map(|lag| format!("lag_{}", lag)).collect();
        fields.push(RETURN_FIELD.to_string());
        fields.extend(self.ma_windows.iter().map(|w| format!("ma_{}", w)));
        FeatureSchema::new(fields)
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_lags: 5,
            ma_windows: [5, 10, 20].into_iter().collect(),
        }
    }
}

/// Ordered list of feature names a model is trained on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureSchema {
    fields: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema from ordered field names
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Field names in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Fail with `SchemaMismatch` unless `other` is the same schema
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(ForecastError::SchemaMismatch {
                expected: self.fields.clone(),
                found: other.fields.clone(),
            })
        }
    }
}

/// Fixed-width numeric vector laid out by a [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Create a vector, checking its width against the schema
    pub fn new(schema: FeatureSchema, values: Vec<f64>) -> Result<Self> {
        if schema.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Feature vector has {} values for {} fields",
                values.len(),
                schema.len()
            )));
        }
        Ok(Self { schema, values })
    }

    /// Schema this vector was built with
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Values in schema order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named field
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.index_of(name).map(|i| self.values[i])
    }
}

/// A feature vector anchored at a time step of the source series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    /// Index of the reference time step in the source series
    pub index: usize,
    /// Timestamp of the reference time step
    pub timestamp: DateTime<Utc>,
    /// Features computed from closes up to and including `index`
    pub vector: FeatureVector,
}

/// Build one feature row per time step with complete trailing history.
///
/// Produces exactly `len - max(n_lags, max window)` rows.
pub fn build_features(series: &PriceSeries, config: &FeatureConfig) -> Result<Vec<FeatureRow>> {
    config.validate()?;

    let warmup = config.warmup();
    let closes = series.closes();
    if closes.len() <= warmup {
        return Err(ForecastError::InsufficientHistory {
            required: warmup,
            available: closes.len(),
        });
    }

    let schema = config.schema();
    let mut averages = config
        .ma_windows
        .iter()
        .map(|&w| SimpleMovingAverage::new(w))
        .collect::<trade_math::Result<Vec<_>>>()?;

    let timestamps = series.timestamps();
    let mut rows = Vec::with_capacity(closes.len() - warmup);

    for (t, &close) in closes.iter().enumerate() {
        for sma in averages.iter_mut() {
            sma.update(close)?;
        }
        if t < warmup {
            continue;
        }

        let mut values = Vec::with_capacity(schema.len());
        values.extend((1..=config.n_lags).map(|lag| closes[t - lag]));
        values.push(simple_return(closes[t - 1], close)?);
        for sma in &averages {
            values.push(sma.value()?);
        }

        rows.push(FeatureRow {
            index: t,
            timestamp: timestamps[t],
            vector: FeatureVector::new(schema.clone(), values)?,
        });
    }

    Ok(rows)
}

/// Build a feature vector from the tail of a live close buffer.
///
/// Lags are the last `n_lags` entries, nearest first. `return_1` is 0.0 with
/// fewer than two entries. A window longer than the buffer averages everything
/// available.
pub fn vector_from_tail(closes: &[f64], config: &FeatureConfig) -> Result<FeatureVector> {
    config.validate()?;
    if closes.len() < config.n_lags {
        return Err(ForecastError::InsufficientSeed {
            required: config.n_lags,
            available: closes.len(),
        });
    }

    let n = closes.len();
    let mut values = Vec::with_capacity(config.n_lags + 1 + config.ma_windows.len());
    values.extend((1..=config.n_lags).map(|lag| closes[n - lag]));
    values.push(if n >= 2 {
        simple_return(closes[n - 2], closes[n - 1])?
    } else {
        0.0
    });
    for &w in &config.ma_windows {
        values.push(trailing_mean(closes, w)?);
    }

    FeatureVector::new(config.schema(), values)
}
