//! Ordinary least squares regression

use crate::dataset::Sample;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::models::{design_matrix, FittedRegressor, Regressor};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use std::fmt;

type Ols = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Linear regressor solved with SVD, which tolerates collinear features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearRegressor;

/// Fitted linear model
pub struct FittedLinear {
    schema: FeatureSchema,
    model: Ols,
}

impl LinearRegressor {
    /// Create a new linear regressor
    pub fn new() -> Self {
        Self
    }
}

impl Regressor for LinearRegressor {
    type Fitted = FittedLinear;

    fn fit(&self, samples: &[Sample], schema: &FeatureSchema) -> Result<Self::Fitted> {
        let (x, y) = design_matrix(samples, schema)?;
        let matrix = DenseMatrix::from_2d_vec(&x)?;
        let params =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
        let model = LinearRegression::fit(&matrix, &y, params)?;

        Ok(FittedLinear {
            schema: schema.clone(),
            model,
        })
    }

    fn name(&self) -> &str {
        "Linear Regression (SVD)"
    }
}

impl FittedRegressor for FittedLinear {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.schema.ensure_matches(features.schema())?;

        let matrix = DenseMatrix::from_2d_vec(&vec![features.values().to_vec()])?;
        let predictions = self.model.predict(&matrix)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::ModelError("No prediction returned".to_string()))
    }

    fn name(&self) -> &str {
        "Linear Regression (SVD)"
    }
}

impl fmt::Debug for FittedLinear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedLinear")
            .field("schema", &self.schema)
            .finish()
    }
}
