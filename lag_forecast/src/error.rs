//! Error types for the lag_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the lag_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The price provider returned nothing for the request
    #[error("No data for {symbol} (period={period}, interval={interval})")]
    NoData {
        symbol: String,
        period: String,
        interval: String,
    },

    /// Not enough bars to build a single feature row
    #[error("Insufficient history: need more than {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// No trainable samples remained after aligning features with targets
    #[error("Dataset is empty: no (features, target) pairs could be formed")]
    EmptyDataset,

    /// Forecast seed is shorter than the lag window
    #[error("Insufficient seed: need at least {required} closes, have {available}")]
    InsufficientSeed { required: usize, available: usize },

    /// A feature vector does not match the schema the model was trained on
    #[error("Schema mismatch: expected [{}], found [{}]", .expected.join(", "), .found.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error raised by a regressor while fitting or predicting
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// A retrieval took longer than allowed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Error talking to a remote price provider
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error encoding or decoding JSON/TOML
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error from the rolling-window math
    #[error("Math error: {0}")]
    MathError(#[from] trade_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<smartcore::error::Failed> for ForecastError {
    fn from(err: smartcore::error::Failed) -> Self {
        ForecastError::ModelError(err.to_string())
    }
}
