use assert_approx_eq::assert_approx_eq;
use chrono::{TimeZone, Utc};
use lag_forecast::features::{build_features, vector_from_tail, FeatureConfig};
use lag_forecast::{ForecastError, PriceSeries};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn series_from(closes: &[f64]) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    PriceSeries::from_closes("TEST", start, closes).unwrap()
}

fn ramp(len: usize) -> Vec<f64> {
    (0..len).map(|i| 10.0 + i as f64).collect()
}

#[test]
fn test_schema_field_order() {
    let config = FeatureConfig::new(3, [20, 5, 10]).unwrap();
    let schema = config.schema();

    assert_eq!(
        schema.fields(),
        &["lag_1", "lag_2", "lag_3", "return_1", "ma_5", "ma_10", "ma_20"]
    );
}

#[rstest]
#[case(30, 5, vec![5, 10, 20], 10)]
#[case(21, 5, vec![5, 10, 20], 1)]
#[case(10, 3, vec![2], 7)]
#[case(10, 3, vec![], 7)]
#[case(11, 2, vec![2], 9)]
#[case(12, 8, vec![3], 4)]
fn test_row_count(
    #[case] len: usize,
    #[case] n_lags: usize,
    #[case] windows: Vec<usize>,
    #[case] expected: usize,
) {
    let config = FeatureConfig::new(n_lags, windows).unwrap();
    let rows = build_features(&series_from(&ramp(len)), &config).unwrap();

    assert_eq!(rows.len(), expected);
    assert_eq!(rows.len(), len - config.warmup());
    assert_eq!(rows[0].index, config.warmup());
}

#[test]
fn test_exact_window_length_is_insufficient() {
    let config = FeatureConfig::new(5, [5, 10, 20]).unwrap();
    let result = build_features(&series_from(&ramp(20)), &config);

    match result {
        Err(ForecastError::InsufficientHistory {
            required,
            available,
        }) => {
            assert_eq!(required, 20);
            assert_eq!(available, 20);
        }
        other => panic!("Expected InsufficientHistory, got {:?}", other),
    }
}

#[test]
fn test_row_values() {
    let config = FeatureConfig::new(2, [2]).unwrap();
    let rows = build_features(&series_from(&ramp(11)), &config).unwrap();

    let first = &rows[0].vector;
    assert_eq!(rows[0].index, 2);
    assert_eq!(first.get("lag_1"), Some(11.0));
    assert_eq!(first.get("lag_2"), Some(10.0));
    assert_approx_eq!(first.get("return_1").unwrap(), 1.0 / 11.0);
    assert_approx_eq!(first.get("ma_2").unwrap(), 11.5);

    let last = &rows[rows.len() - 1].vector;
    assert_eq!(last.get("lag_1"), Some(19.0));
    assert_approx_eq!(last.get("ma_2").unwrap(), 19.5);
}

#[test]
fn test_features_never_see_the_target() {
    let closes = vec![
        100.0, 101.5, 99.0, 103.0, 104.5, 102.0, 108.0, 107.0, 111.0, 109.5, 115.0, 113.0,
    ];
    let config = FeatureConfig::new(3, [2, 4]).unwrap();
    let full = series_from(&closes);
    let rows = build_features(&full, &config).unwrap();

    for row in &rows {
        // Rebuild from a prefix ending at the reference step: the target close[t+1]
        // and everything after it are absent, yet the row must be identical.
        let prefix = PriceSeries::new("TEST", full.bars()[..=row.index].to_vec()).unwrap();
        let prefix_rows = build_features(&prefix, &config).unwrap();
        let rebuilt = prefix_rows.last().unwrap();

        assert_eq!(rebuilt.index, row.index);
        assert_eq!(rebuilt.vector, row.vector);
    }
}

#[test]
fn test_zero_lags_rejected() {
    let result = FeatureConfig::new(0, [5]);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));

    let result = FeatureConfig::new(2, [0, 5]);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_tail_vector_uses_latest_close_as_lag_1() {
    let config = FeatureConfig::new(2, [2]).unwrap();
    let vector = vector_from_tail(&[10.0, 12.0, 15.0], &config).unwrap();

    assert_eq!(vector.schema(), &config.schema());
    assert_eq!(vector.get("lag_1"), Some(15.0));
    assert_eq!(vector.get("lag_2"), Some(12.0));
    assert_approx_eq!(vector.get("return_1").unwrap(), 0.25);
    assert_approx_eq!(vector.get("ma_2").unwrap(), 13.5);
}

#[test]
fn test_tail_vector_degraded_window() {
    // Seed of three closes against a window of five: mean over all three
    let config = FeatureConfig::new(2, [5]).unwrap();
    let vector = vector_from_tail(&[10.0, 20.0, 30.0], &config).unwrap();

    assert_approx_eq!(vector.get("ma_5").unwrap(), 20.0);
}

#[test]
fn test_tail_vector_single_entry_has_zero_return() {
    let config = FeatureConfig::new(1, [3]).unwrap();
    let vector = vector_from_tail(&[42.0], &config).unwrap();

    assert_eq!(vector.get("return_1"), Some(0.0));
    assert_eq!(vector.get("ma_3"), Some(42.0));
}
