//! Random forest regression (ensemble of bootstrapped trees)

use crate::dataset::Sample;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::models::{design_matrix, FittedRegressor, Regressor};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor as SmartForest, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use tracing::debug;

type Forest = SmartForest<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest regressor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestRegressor {
    /// Name of the model
    name: String,
    /// Number of trees
    n_trees: usize,
    /// Seed for bootstrap sampling and feature selection
    seed: u64,
    /// Optional depth limit per tree
    max_depth: Option<u16>,
    /// Minimum samples required to split a node
    min_samples_split: usize,
}

/// Fitted random forest
pub struct FittedForest {
    name: String,
    schema: FeatureSchema,
    n_trees: usize,
    forest: Forest,
}

impl RandomForestRegressor {
    /// Create a new random forest with `n_trees` trees and a fixed seed
    pub fn new(n_trees: usize, seed: u64) -> Result<Self> {
        if n_trees == 0 {
            return Err(ForecastError::ValidationError(
                "Random forest needs at least one tree".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Random Forest (trees={}, seed={})", n_trees, seed),
            n_trees,
            seed,
            max_depth: None,
            min_samples_split: 2,
        })
    }

    /// Limit the depth of every tree
    pub fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Set the minimum samples required to split a node
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Number of trees in the ensemble
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Minimum samples required to split a node
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    fn parameters(&self) -> RandomForestRegressorParameters {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_seed(self.seed)
            .with_min_samples_split(self.min_samples_split);
        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self {
            name: "Random Forest (trees=200, seed=42)".to_string(),
            n_trees: 200,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl Regressor for RandomForestRegressor {
    type Fitted = FittedForest;

    fn fit(&self, samples: &[Sample], schema: &FeatureSchema) -> Result<Self::Fitted> {
        let (x, y) = design_matrix(samples, schema)?;
        debug!(
            samples = x.len(),
            features = schema.len(),
            trees = self.n_trees,
            "fitting random forest"
        );

        let matrix = DenseMatrix::from_2d_vec(&x)?;
        let forest = SmartForest::fit(&matrix, &y, self.parameters())?;

        Ok(FittedForest {
            name: self.name.clone(),
            schema: schema.clone(),
            n_trees: self.n_trees,
            forest,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedRegressor for FittedForest {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.schema.ensure_matches(features.schema())?;

        let matrix = DenseMatrix::from_2d_vec(&vec![features.values().to_vec()])?;
        let predictions = self.forest.predict(&matrix)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::ModelError("No prediction returned".to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FittedForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedForest")
            .field("name", &self.name)
            .field("n_trees", &self.n_trees)
            .field("schema", &self.schema)
            .finish()
    }
}
