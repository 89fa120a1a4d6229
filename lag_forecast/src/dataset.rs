//! Pairing feature rows with next-step targets and splitting them in time order

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, FeatureSchema, FeatureVector};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default share of samples used for training
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

/// A feature vector paired with the close one step after its reference time step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Reference timestamp of the features
    pub timestamp: DateTime<Utc>,
    /// Features known at the reference time step
    pub features: FeatureVector,
    /// Close at the following time step
    pub target: f64,
}

/// Chronologically ordered samples with a fixed train/evaluation boundary
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: FeatureSchema,
    samples: Vec<Sample>,
    split_index: usize,
    seed_row: Option<FeatureRow>,
}

impl Dataset {
    /// Schema shared by every sample
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// All samples in time order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first evaluation sample
    pub fn split_index(&self) -> usize {
        self.split_index
    }

    /// Training prefix
    pub fn training(&self) -> &[Sample] {
        &self.samples[..self.split_index]
    }

    /// Evaluation suffix
    pub fn evaluation(&self) -> &[Sample] {
        &self.samples[self.split_index..]
    }

    /// The most recent feature row, which has no known successor.
    ///
    /// Its close is the current price the forecast starts from.
    pub fn seed_row(&self) -> Option<&FeatureRow> {
        self.seed_row.as_ref()
    }
}

/// Pair each feature row with the close one step later and split at
/// `floor(len * split_ratio)`.
///
/// Rows whose successor close is unknown are held out of the samples; the last
/// such row becomes the dataset's seed row.
pub fn assemble(series: &PriceSeries, rows: &[FeatureRow], split_ratio: f64) -> Result<Dataset> {
    if !(split_ratio > 0.0 && split_ratio < 1.0) {
        return Err(ForecastError::ValidationError(format!(
            "Split ratio must be strictly between 0 and 1, got {}",
            split_ratio
        )));
    }

    let schema = match rows.first() {
        Some(row) => row.vector.schema().clone(),
        None => return Err(ForecastError::EmptyDataset),
    };

    let mut samples = Vec::with_capacity(rows.len());
    let mut seed_row = None;
    for row in rows {
        schema.ensure_matches(row.vector.schema())?;
        match series.close_at(row.index + 1) {
            Some(target) => samples.push(Sample {
                timestamp: row.timestamp,
                features: row.vector.clone(),
                target,
            }),
            None => seed_row = Some(row.clone()),
        }
    }

    if samples.is_empty() {
        return Err(ForecastError::EmptyDataset);
    }

    let split_index = (samples.len() as f64 * split_ratio).floor() as usize;

    Ok(Dataset {
        schema,
        samples,
        split_index,
        seed_row,
    })
}
