//! End-to-end run: retrieve, build features, train, evaluate, forecast, report

use crate::config::ForecastConfig;
use crate::data::PriceSeries;
use crate::dataset::assemble;
use crate::error::{ForecastError, Result};
use crate::features::{build_features, FeatureRow};
use crate::forecaster::{forecast, seed_closes, ForecastPath};
use crate::metrics::{evaluate, EvaluationMetrics};
use crate::models::{LinearRegressor, RandomForestRegressor, Regressor, RegressorKind};
use crate::report::ForecastReport;
use crate::source::PriceSource;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// What a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Instrument symbol
    pub symbol: String,
    /// Name of the fitted model
    pub model: String,
    /// Bars retrieved
    pub bars: usize,
    /// Samples in the training prefix
    pub train_samples: usize,
    /// Samples in the evaluation suffix
    pub eval_samples: usize,
    /// Errors on the evaluation suffix
    pub metrics: EvaluationMetrics,
    /// Real closes the forecast started from
    pub seed: Vec<f64>,
    /// Predicted closes
    pub path: ForecastPath,
    /// Per-day profit/loss
    pub report: ForecastReport,
}

/// Close at the seed row, which must also be the last close of the forecast seed
fn seed_price(series: &PriceSeries, seed_row: Option<&FeatureRow>, seed: &[f64]) -> Result<f64> {
    let row = seed_row.ok_or_else(|| {
        ForecastError::DataError("No feature row is left to seed the forecast".to_string())
    })?;
    let price = series.close_at(row.index).ok_or_else(|| {
        ForecastError::DataError(format!("Seed row {} is outside the series", row.index))
    })?;

    match seed.last() {
        Some(&last) if last == price => Ok(price),
        Some(&last) => Err(ForecastError::DataError(format!(
            "Forecast seed ends at {} but the seed row close is {}",
            last, price
        ))),
        None => Err(ForecastError::InsufficientSeed {
            required: 1,
            available: 0,
        }),
    }
}

/// One forecast run over a validated configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ForecastConfig,
}

impl Pipeline {
    /// Create a pipeline; the configuration is validated before anything runs
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Retrieve history from `source`, then run on it
    pub async fn run(&self, source: &dyn PriceSource) -> Result<PipelineOutcome> {
        let series = self.fetch(source).await?;
        self.run_on_series(&series)
    }

    async fn fetch(&self, source: &dyn PriceSource) -> Result<PriceSeries> {
        let cfg = &self.config;
        info!(
            ticker = %cfg.ticker,
            period = %cfg.period,
            interval = %cfg.interval,
            source = source.name(),
            "retrieving price history"
        );

        let request = source.get_price_series(&cfg.ticker, cfg.period, cfg.interval);
        if cfg.fetch_timeout_secs == 0 {
            return request.await;
        }

        tokio::time::timeout(Duration::from_secs(cfg.fetch_timeout_secs), request)
            .await
            .map_err(|_| {
                ForecastError::Timeout(format!(
                    "retrieving {} took longer than {}s",
                    cfg.ticker, cfg.fetch_timeout_secs
                ))
            })?
    }

    /// Run on an already retrieved series with the configured regressor
    pub fn run_on_series(&self, series: &PriceSeries) -> Result<PipelineOutcome> {
        match self.config.regressor {
            RegressorKind::RandomForest => {
                let settings = &self.config.forest;
                let mut forest = RandomForestRegressor::new(settings.n_trees, settings.seed)?
                    .with_min_samples_split(settings.min_samples_split);
                if let Some(depth) = settings.max_depth {
                    forest = forest.with_max_depth(depth);
                }
                self.run_with(series, &forest)
            }
            RegressorKind::Linear => self.run_with(series, &LinearRegressor::new()),
        }
    }

    /// Run on `series` with an explicit regressor
    #[instrument(skip_all, fields(symbol = series.symbol(), model = regressor.name()))]
    pub fn run_with<R: Regressor>(
        &self,
        series: &PriceSeries,
        regressor: &R,
    ) -> Result<PipelineOutcome> {
        let cfg = &self.config;

        info!(bars = series.len(), "building features");
        let rows = build_features(series, &cfg.features)?;
        let dataset = assemble(series, &rows, cfg.split_ratio)?;
        info!(
            train = dataset.training().len(),
            eval = dataset.evaluation().len(),
            "assembled dataset"
        );

        let model = regressor.fit(dataset.training(), dataset.schema())?;
        let metrics = evaluate(&model, dataset.evaluation())?;
        info!(mse = metrics.mse, mae = metrics.mae, "evaluated model");

        let seed = seed_closes(series, &rows, &cfg.features);
        let current_price = seed_price(series, dataset.seed_row(), &seed)?;
        let path = forecast(&model, &seed, dataset.schema(), &cfg.features, cfg.horizon)?;
        info!(horizon = path.len(), "forecast complete");

        let report = ForecastReport::new(
            series.symbol(),
            current_price,
            &path,
            &cfg.conversion,
            cfg.no_change_tolerance,
        )?;

        Ok(PipelineOutcome {
            symbol: series.symbol().to_string(),
            model: regressor.name().to_string(),
            bars: series.len(),
            train_samples: dataset.training().len(),
            eval_samples: dataset.evaluation().len(),
            metrics,
            seed,
            path,
            report,
        })
    }
}
