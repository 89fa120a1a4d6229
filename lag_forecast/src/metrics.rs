//! Metrics for evaluating a fitted regressor on held-out samples

use crate::dataset::Sample;
use crate::error::{ForecastError, Result};
use crate::models::FittedRegressor;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Error metrics over the evaluation partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean of `actual - predicted` (positive means the model under-predicts)
    pub mean_error: f64,
    /// Number of samples scored
    pub count: usize,
}

/// Score `model` against the targets of `samples`
pub fn evaluate<M: FittedRegressor + ?Sized>(
    model: &M,
    samples: &[Sample],
) -> Result<EvaluationMetrics> {
    if samples.is_empty() {
        return Err(ForecastError::EmptyDataset);
    }

    let predicted = samples
        .iter()
        .map(|sample| model.predict(&sample.features))
        .collect::<Result<Vec<f64>>>()?;
    let actual: Vec<f64> = samples.iter().map(|s| s.target).collect();

    error_metrics(&predicted, &actual)
}

/// Compute error metrics between predicted and actual values
pub fn error_metrics(predicted: &[f64], actual: &[f64]) -> Result<EvaluationMetrics> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(ForecastError::ValidationError(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .map(|(&a, &p)| a - p)
        .collect();

    let mse = errors.iter().map(|e| e.powi(2)).mean();
    let mae = errors.iter().map(|e| e.abs()).mean();

    Ok(EvaluationMetrics {
        mse,
        mae,
        rmse: mse.sqrt(),
        mean_error: errors.iter().mean(),
        count: errors.len(),
    })
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Evaluation (n={}): MSE={:.6}, MAE={:.6}, RMSE={:.6}",
            self.count, self.mse, self.mae, self.rmse
        )
    }
}
