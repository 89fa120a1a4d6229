use chrono::{Duration, TimeZone, Utc};
use lag_forecast::data::{generate_random_walk, parse_timestamp};
use lag_forecast::{DataLoader, ForecastError, Period, PriceBar, PriceSeries};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_ohlc_csv() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "ACME.csv",
        "Date,Open,High,Low,Close,Volume\n\
         2024-01-02,10.0,11.0,9.5,10.5,1000\n\
         2024-01-03,10.5,11.5,10.0,11.0,1200\n\
         2024-01-04,11.0,12.0,10.5,11.75,900\n",
    );

    let series = DataLoader::from_csv("ACME", &path).unwrap();

    assert_eq!(series.symbol(), "ACME");
    assert_eq!(series.closes(), vec![10.5, 11.0, 11.75]);
    assert_eq!(series.bars()[1].open, 10.5);
    assert_eq!(
        series.timestamps()[0],
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_load_price_column_without_open() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "X.csv",
        "timestamp,price\n2024-05-01 09:30:00,5.0\n2024-05-01 09:31:00,5.5\n",
    );

    let series = DataLoader::from_csv("X", &path).unwrap();
    assert_eq!(series.closes(), vec![5.0, 5.5]);
    assert_eq!(series.bars()[0].open, 5.0);
}

#[test]
fn test_rows_without_close_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "GAP.csv",
        "date,close\n2024-01-01,1.0\n2024-01-02,\n2024-01-03,3.0\n",
    );

    let series = DataLoader::from_csv("GAP", &path).unwrap();
    assert_eq!(series.closes(), vec![1.0, 3.0]);
}

#[test]
fn test_missing_columns() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "BAD.csv", "date,volume\n2024-01-01,100\n");
    assert!(matches!(
        DataLoader::from_csv("BAD", &path),
        Err(ForecastError::DataError(_))
    ));

    assert!(matches!(
        DataLoader::from_csv("NONE", dir.path().join("NONE.csv")),
        Err(ForecastError::IoError(_))
    ));
}

#[test]
fn test_series_rejects_unordered_timestamps() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let bars = vec![
        PriceBar::new(t0, 1.0, 1.0),
        PriceBar::new(t0 - Duration::days(1), 1.0, 1.0),
    ];
    assert!(matches!(
        PriceSeries::new("X", bars),
        Err(ForecastError::DataError(_))
    ));

    let dup = vec![PriceBar::new(t0, 1.0, 1.0), PriceBar::new(t0, 2.0, 2.0)];
    assert!(PriceSeries::new("X", dup).is_err());
}

#[test]
fn test_series_rejects_non_finite_prices() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let result = PriceSeries::from_closes("X", t0, &[1.0, f64::NAN]);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_within_period() {
    let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
    let closes = vec![1.0; 800];
    let series = PriceSeries::from_closes("X", start, &closes).unwrap();

    assert_eq!(series.within(Period::Max).len(), 800);
    assert_eq!(series.within(Period::TwoYears).len(), 731);
    assert_eq!(series.within(Period::OneMonth).len(), 31);
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
    assert_eq!(parse_timestamp("2024-02-29").unwrap(), expected);
    assert_eq!(parse_timestamp("2024-02-29T00:00:00Z").unwrap(), expected);
    assert_eq!(parse_timestamp(" 2024-02-29 00:00:00 ").unwrap(), expected);
    assert!(parse_timestamp("29/02/2024").is_err());
}

#[test]
fn test_random_walk_is_reproducible() {
    let a = generate_random_walk("W", 50, 100.0, 0.0, 0.02, 9).unwrap();
    let b = generate_random_walk("W", 50, 100.0, 0.0, 0.02, 9).unwrap();
    let c = generate_random_walk("W", 50, 100.0, 0.0, 0.02, 10).unwrap();

    assert_eq!(a, b);
    assert_ne!(a.closes(), c.closes());
    assert_eq!(a.len(), 50);
    assert_eq!(a.closes()[0], 100.0);
    assert!(a.closes().iter().all(|c| *c > 0.0));
}

#[test]
fn test_random_walk_rejects_bad_start() {
    assert!(generate_random_walk("W", 5, 0.0, 0.0, 0.01, 1).is_err());
    assert!(generate_random_walk("W", 5, 10.0, 0.0, -1.0, 1).is_err());
}

#[rstest]
#[case(-0.01)]
#[case(-1.0)]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn test_random_walk_rejects_bad_volatility(#[case] volatility: f64) {
    let result = generate_random_walk("W", 5, 10.0, 0.0, volatility, 1);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_random_walk_zero_volatility_follows_drift() {
    let walk = generate_random_walk("W", 3, 100.0, 0.01, 0.0, 1).unwrap();
    let closes = walk.closes();

    assert_eq!(closes[0], 100.0);
    assert!((closes[1] - 101.0).abs() < 1e-9);
    assert!((closes[2] - 102.01).abs() < 1e-9);
}
