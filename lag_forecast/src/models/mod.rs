//! Regression models behind a fit/predict seam
//!
//! The feature builder and the forecaster only see [`Regressor`] and
//! [`FittedRegressor`], so any algorithm can be swapped in.

use crate::dataset::Sample;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod linear;
pub mod random_forest;

pub use linear::{FittedLinear, LinearRegressor};
pub use random_forest::{FittedForest, RandomForestRegressor};

/// A fitted model, immutable after training
pub trait FittedRegressor: Debug {
    /// Schema of the vectors this model was trained on
    fn schema(&self) -> &FeatureSchema;

    /// Predict the next close for one feature vector.
    ///
    /// Implementations must reject a vector whose schema differs from
    /// [`FittedRegressor::schema`].
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Regression algorithm that can be fitted on training samples
pub trait Regressor: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedRegressor;

    /// Fit on training samples that all follow `schema`. Must not mutate the samples.
    fn fit(&self, samples: &[Sample], schema: &FeatureSchema) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Which concrete regressor a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegressorKind {
    #[default]
    RandomForest,
    Linear,
}

impl std::str::FromStr for RegressorKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "random_forest" | "forest" | "rf" => Ok(RegressorKind::RandomForest),
            "linear" | "ols" => Ok(RegressorKind::Linear),
            other => Err(ForecastError::ValidationError(format!(
                "Unknown regressor '{}'. Expected random_forest or linear",
                other
            ))),
        }
    }
}

/// Split samples into the row-major matrix and target vector regressors consume
pub(crate) fn design_matrix(
    samples: &[Sample],
    schema: &FeatureSchema,
) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    if samples.is_empty() {
        return Err(ForecastError::EmptyDataset);
    }

    let mut x = Vec::with_capacity(samples.len());
    let mut y = Vec::with_capacity(samples.len());
    for sample in samples {
        schema.ensure_matches(sample.features.schema())?;
        x.push(sample.features.values().to_vec());
        y.push(sample.target);
    }

    Ok((x, y))
}
