//! Autoregressive multi-step forecasting
//!
//! Each step builds a feature vector from the tail of a close buffer, asks the
//! model for the next close, and appends the prediction to the buffer. Later
//! steps therefore see earlier predictions, not ground truth, and errors compound.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::features::{vector_from_tail, FeatureConfig, FeatureRow, FeatureSchema};
use crate::models::FittedRegressor;
use serde::Serialize;
use tracing::debug;

/// Extra closes kept in the seed beyond the widest window
pub const SEED_PADDING: usize = 5;

/// Predicted closes, one per future step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastPath {
    values: Vec<f64>,
}

impl ForecastPath {
    /// Predicted closes in step order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of steps forecast
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was forecast
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f64>> for ForecastPath {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

/// Where the forecast loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastState {
    /// Buffer holds only real closes
    Seeded,
    /// At least one prediction has been appended
    Stepping,
    /// Horizon exhausted, or a step failed
    Done,
}

/// Step-by-step forecaster that owns its close buffer.
///
/// Iterating yields one prediction per step until `horizon` is reached. After an
/// error the iterator is fused in the `Done` state.
#[derive(Debug)]
pub struct Forecaster<'m, M: FittedRegressor + ?Sized> {
    model: &'m M,
    config: FeatureConfig,
    closes: Vec<f64>,
    horizon: usize,
    produced: usize,
    state: ForecastState,
}

impl<'m, M: FittedRegressor + ?Sized> Forecaster<'m, M> {
    /// Seed a forecaster with the most recent real closes.
    ///
    /// Fails with `InsufficientSeed` when fewer than `n_lags + 1` closes are given,
    /// and with `SchemaMismatch` when `schema` is not the layout `config` produces
    /// or not the layout `model` was trained on.
    pub fn new(
        model: &'m M,
        recent_closes: Vec<f64>,
        schema: &FeatureSchema,
        config: &FeatureConfig,
        horizon: usize,
    ) -> Result<Self> {
        config.validate()?;
        if recent_closes.len() < config.n_lags + 1 {
            return Err(ForecastError::InsufficientSeed {
                required: config.n_lags + 1,
                available: recent_closes.len(),
            });
        }
        schema.ensure_matches(&config.schema())?;
        model.schema().ensure_matches(schema)?;

        let mut closes = recent_closes;
        closes.reserve(horizon);

        Ok(Self {
            model,
            config: config.clone(),
            closes,
            horizon,
            produced: 0,
            state: if horizon == 0 {
                ForecastState::Done
            } else {
                ForecastState::Seeded
            },
        })
    }

    /// Current loop state
    pub fn state(&self) -> ForecastState {
        self.state
    }

    /// Real closes followed by every prediction so far
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// Run one step: build features from the live tail, predict, append
    fn step(&mut self) -> Result<f64> {
        let vector = vector_from_tail(&self.closes, &self.config)?;
        let next = self.model.predict(&vector)?;
        if !next.is_finite() {
            return Err(ForecastError::ModelError(format!(
                "Model produced a non-finite prediction at step {}",
                self.produced + 1
            )));
        }

        self.closes.push(next);
        self.produced += 1;
        debug!(step = self.produced, prediction = next, "forecast step");
        Ok(next)
    }
}

impl<M: FittedRegressor + ?Sized> Iterator for Forecaster<'_, M> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ForecastState::Done {
            return None;
        }

        self.state = ForecastState::Stepping;
        let result = self.step();
        if result.is_err() || self.produced == self.horizon {
            self.state = ForecastState::Done;
        }
        Some(result)
    }
}

/// Forecast `horizon` closes past the end of `recent_closes`.
///
/// Either every step succeeds and the full path is returned, or the first error
/// aborts the forecast.
pub fn forecast<M: FittedRegressor + ?Sized>(
    model: &M,
    recent_closes: &[f64],
    schema: &FeatureSchema,
    config: &FeatureConfig,
    horizon: usize,
) -> Result<ForecastPath> {
    let values = Forecaster::new(model, recent_closes.to_vec(), schema, config, horizon)?
        .collect::<Result<Vec<f64>>>()?;
    Ok(ForecastPath { values })
}

/// Select the forecast seed: the last `max(n_lags, max window) + 5` closes among
/// the time steps that carry a feature row.
pub fn seed_closes(series: &PriceSeries, rows: &[FeatureRow], config: &FeatureConfig) -> Vec<f64> {
    let needed = config.warmup() + SEED_PADDING;
    let start = rows.len().saturating_sub(needed);

    rows[start..]
        .iter()
        .filter_map(|row| series.close_at(row.index))
        .collect()
}
