use assert_approx_eq::assert_approx_eq;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use lag_forecast::data::generate_random_walk;
use lag_forecast::features::FeatureConfig;
use lag_forecast::{
    CsvPriceSource, FeatureSchema, FeatureVector, FittedRegressor, ForecastConfig, ForecastError,
    InMemoryPriceSource, Interval, Outcome, Period, Pipeline, PriceSeries, PriceSource, Regressor,
    RegressorKind, Result, Sample,
};
use pretty_assertions::assert_eq;
use std::fmt::Write as _;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct LagPlusOne;

#[derive(Debug)]
struct FittedLagPlusOne {
    schema: FeatureSchema,
}

impl Regressor for LagPlusOne {
    type Fitted = FittedLagPlusOne;

    fn fit(&self, _samples: &[Sample], schema: &FeatureSchema) -> Result<Self::Fitted> {
        Ok(FittedLagPlusOne {
            schema: schema.clone(),
        })
    }

    fn name(&self) -> &str {
        "lag_1 + 1"
    }
}

impl FittedRegressor for FittedLagPlusOne {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.schema.ensure_matches(features.schema())?;
        features
            .get("lag_1")
            .map(|lag| lag + 1.0)
            .ok_or_else(|| ForecastError::ModelError("lag_1 missing".to_string()))
    }

    fn name(&self) -> &str {
        "lag_1 + 1"
    }
}

/// Never answers in time
struct StalledSource;

#[async_trait]
impl PriceSource for StalledSource {
    async fn get_price_series(
        &self,
        _symbol: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<PriceSeries> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(ForecastError::DataError("unreachable".to_string()))
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

fn small_config(ticker: &str) -> ForecastConfig {
    let mut config = ForecastConfig::for_ticker(ticker);
    config.features = FeatureConfig::new(2, [2]).unwrap();
    config.horizon = 2;
    config
}

#[test]
fn test_pipeline_on_ramp() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let closes: Vec<f64> = (10..=20).map(|c| c as f64).collect();
    let series = PriceSeries::from_closes("TEST", start, &closes).unwrap();

    let pipeline = Pipeline::new(small_config("TEST")).unwrap();
    let outcome = pipeline.run_with(&series, &LagPlusOne).unwrap();

    assert_eq!(outcome.bars, 11);
    assert_eq!(outcome.train_samples, 6);
    assert_eq!(outcome.eval_samples, 2);
    // Trained with lag_1 = close[t-1], so every evaluation target is one higher
    assert_approx_eq!(outcome.metrics.mse, 1.0);
    assert_approx_eq!(outcome.metrics.mae, 1.0);

    assert_eq!(outcome.path.values(), &[21.0, 22.0]);
    assert_eq!(outcome.report.current_price, 20.0);
    assert_eq!(outcome.report.days[0].outcome, Outcome::Profit);
    assert_approx_eq!(outcome.report.days[1].change_pct, 10.0);
    assert_approx_eq!(outcome.report.days[1].change_converted, 180.0);
}

#[test]
fn test_pipeline_too_short_history() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let series = PriceSeries::from_closes("TEST", start, &[1.0, 2.0]).unwrap();
    let pipeline = Pipeline::new(small_config("TEST")).unwrap();

    assert!(matches!(
        pipeline.run_with(&series, &LagPlusOne),
        Err(ForecastError::InsufficientHistory { .. })
    ));
}

#[tokio::test]
async fn test_pipeline_random_forest_in_memory() {
    let series = generate_random_walk("WALK", 160, 50.0, 0.001, 0.015, 11).unwrap();
    let source = InMemoryPriceSource::new().with_series(series);

    let mut config = ForecastConfig::for_ticker("WALK");
    config.forest.n_trees = 20;
    config.horizon = 4;
    let outcome = Pipeline::new(config).unwrap().run(&source).await.unwrap();

    assert_eq!(outcome.bars, 160);
    assert_eq!(outcome.train_samples + outcome.eval_samples, 160 - 20 - 1);
    assert_eq!(outcome.seed.len(), 25);
    assert_eq!(outcome.path.len(), 4);
    assert_eq!(outcome.report.days.len(), 4);
    assert!(outcome.path.values().iter().all(|v| v.is_finite() && *v > 0.0));
    assert!(outcome.model.starts_with("Random Forest"));
}

#[test]
fn test_min_samples_split_reaches_the_forest() {
    let series = generate_random_walk("STUMP", 90, 40.0, 0.0, 0.02, 3).unwrap();

    let mut config = ForecastConfig::for_ticker("STUMP");
    config.forest.n_trees = 10;
    config.forest.min_samples_split = 10_000;
    config.horizon = 3;
    let outcome = Pipeline::new(config).unwrap().run_on_series(&series).unwrap();

    // No node can split, so every tree predicts its bootstrap mean whatever the input
    let values = outcome.path.values();
    assert_approx_eq!(values[0], values[1]);
    assert_approx_eq!(values[1], values[2]);
    assert_eq!(outcome.report.current_price, series.last_close().unwrap());
}

#[tokio::test]
async fn test_pipeline_linear_from_csv() {
    let dir = TempDir::new().unwrap();
    let mut body = String::from("Date,Open,Close\n");
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    for i in 0..60 {
        let day = start + chrono::Duration::days(i);
        let close = 100.0 + (i as f64 * 0.7).sin() * 3.0 + i as f64 * 0.2;
        writeln!(body, "{},{:.4},{:.4}", day.format("%Y-%m-%d"), close - 0.1, close).unwrap();
    }
    std::fs::write(dir.path().join("SINE.csv"), body).unwrap();

    let mut config = ForecastConfig::for_ticker("sine");
    config.regressor = RegressorKind::Linear;
    config.features = FeatureConfig::new(3, [5]).unwrap();
    config.period = Period::Max;

    let source = CsvPriceSource::new(dir.path());
    let outcome = Pipeline::new(config).unwrap().run(&source).await.unwrap();

    assert_eq!(outcome.symbol, "SINE");
    assert_eq!(outcome.bars, 60);
    assert_eq!(outcome.report.days.len(), 3);
    assert!(outcome.metrics.mae.is_finite());
}

#[tokio::test]
async fn test_unknown_symbol_is_no_data() {
    let source = InMemoryPriceSource::new();
    let result = Pipeline::new(ForecastConfig::for_ticker("NOPE"))
        .unwrap()
        .run(&source)
        .await;

    match result {
        Err(ForecastError::NoData { symbol, .. }) => assert_eq!(symbol, "NOPE"),
        other => panic!("Expected NoData, got {:?}", other.map(|o| o.symbol)),
    }

    let dir = TempDir::new().unwrap();
    let result = CsvPriceSource::new(dir.path())
        .get_price_series("NOPE", Period::OneYear, Interval::Daily)
        .await;
    assert!(matches!(result, Err(ForecastError::NoData { .. })));
}

#[tokio::test]
async fn test_retrieval_timeout() {
    let mut config = ForecastConfig::for_ticker("SLOW");
    config.fetch_timeout_secs = 1;

    let result = Pipeline::new(config).unwrap().run(&StalledSource).await;
    assert!(matches!(result, Err(ForecastError::Timeout(_))));
}

#[test]
fn test_pipeline_rejects_invalid_config() {
    let mut config = ForecastConfig::for_ticker("AAPL");
    config.horizon = 0;
    assert!(matches!(
        Pipeline::new(config),
        Err(ForecastError::ValidationError(_))
    ));
}

#[test]
fn test_outcome_serializes() {
    let series = generate_random_walk("JSON", 40, 20.0, 0.0, 0.01, 5).unwrap();
    let pipeline = Pipeline::new(small_config("JSON")).unwrap();
    let outcome = pipeline.run_with(&series, &LagPlusOne).unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["symbol"], "JSON");
    assert_eq!(json["path"]["values"].as_array().unwrap().len(), 2);
    assert!(json["metrics"]["rmse"].is_number());
}
