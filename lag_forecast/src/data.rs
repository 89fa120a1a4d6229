//! Price history handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// A single daily price bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar timestamp
    pub timestamp: DateTime<Utc>,
    /// Open price
    pub open: f64,
    /// Close price
    pub close: f64,
}

impl PriceBar {
    /// Create a new price bar
    pub fn new(timestamp: DateTime<Utc>, open: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            close,
        }
    }
}

/// Ordered price history for one symbol.
///
/// Timestamps are strictly increasing and closes are finite. The series is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a validated price series
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || !bar.open.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "Non-finite price in {} at {}",
                    symbol, bar.timestamp
                )));
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(ForecastError::DataError(format!(
                    "Timestamps for {} must be strictly increasing ({} then {})",
                    symbol,
                    bars[i - 1].timestamp,
                    bar.timestamp
                )));
            }
        }

        Ok(Self { symbol, bars })
    }

    /// Build a series from closes only, one bar per day starting at `start`.
    ///
    /// Open is set equal to close.
    pub fn from_closes(
        symbol: impl Into<String>,
        start: DateTime<Utc>,
        closes: &[f64],
    ) -> Result<Self> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar::new(start + Duration::days(i as i64), close, close))
            .collect();
        Self::new(symbol, bars)
    }

    /// Symbol this series belongs to
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All bars in time order
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Close prices in time order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Timestamps in time order
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// Close price at index `i`
    pub fn close_at(&self, i: usize) -> Option<f64> {
        self.bars.get(i).map(|b| b.close)
    }

    /// Most recent close
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Number of bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Keep only bars at or after `cutoff`
    pub fn since(&self, cutoff: DateTime<Utc>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.timestamp >= cutoff)
                .copied()
                .collect(),
        }
    }

    /// Restrict to the look-back `period` measured from the last bar
    pub fn within(&self, period: Period) -> Self {
        match self.bars.last() {
            Some(last) => match period.start_from(last.timestamp) {
                Some(cutoff) => self.since(cutoff),
                None => self.clone(),
            },
            None => self.clone(),
        }
    }
}

/// Look-back period for a price request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    #[default]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// Provider code for this period
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// First instant covered by this period when it ends at `end`; `None` means unbounded
    pub fn start_from(&self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
            Period::TenYears => 3652,
            Period::YearToDate => {
                return Utc.with_ymd_and_hms(end.year(), 1, 1, 0, 0, 0).single();
            }
            Period::Max => return None,
        };
        Some(end - Duration::days(days))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "10y" => Ok(Period::TenYears),
            "ytd" => Ok(Period::YearToDate),
            "max" => Ok(Period::Max),
            other => Err(ForecastError::ValidationError(format!(
                "Unsupported period '{}'. Expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max",
                other
            ))),
        }
    }
}

/// Bar interval for a price request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    #[default]
    Daily,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Interval {
    /// Provider code for this interval
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::FiveDays => "5d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "daily" => Ok(Interval::Daily),
            "5d" => Ok(Interval::FiveDays),
            "1wk" | "weekly" => Ok(Interval::Weekly),
            "1mo" | "monthly" => Ok(Interval::Monthly),
            other => Err(ForecastError::ValidationError(format!(
                "Unsupported interval '{}'. Expected one of 1d, 5d, 1wk, 1mo",
                other
            ))),
        }
    }
}

/// Data loader for price history files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a price series from a CSV file with a date column and a close column
    pub fn from_csv<P: AsRef<Path>>(symbol: &str, path: P) -> Result<PriceSeries> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(symbol, &df)
    }

    /// Convert a DataFrame into a price series
    pub fn from_dataframe(symbol: &str, df: &DataFrame) -> Result<PriceSeries> {
        let time_column = Self::detect_column(df, &["date", "time", "timestamp"])
            .ok_or_else(|| ForecastError::DataError("No time column found in data".to_string()))?;
        let close_column = Self::detect_column(df, &["close"])
            .or_else(|| Self::detect_column(df, &["price"]))
            .ok_or_else(|| {
                ForecastError::DataError("No close price column found in data".to_string())
            })?;
        let open_column = Self::detect_column(df, &["open"]);

        let timestamps = Self::column_as_timestamps(df, &time_column)?;
        let closes = Self::column_as_f64(df, &close_column)?;
        let opens = match &open_column {
            Some(name) => Self::column_as_f64(df, name)?,
            None => closes.clone(),
        };

        let mut bars = Vec::with_capacity(timestamps.len());
        for i in 0..timestamps.len() {
            // Rows with a missing close are not bars
            let (Some(timestamp), Some(close)) = (timestamps[i], closes[i]) else {
                continue;
            };
            let open = opens[i].unwrap_or(close);
            bars.push(PriceBar::new(timestamp, open, close));
        }

        PriceSeries::new(symbol, bars)
    }

    /// Find the first column whose lowercase name contains one of `needles`
    fn detect_column(df: &DataFrame, needles: &[&str]) -> Option<String> {
        df.get_column_names()
            .into_iter()
            .find(|name| {
                let lower = name.to_lowercase();
                needles.iter().any(|needle| lower.contains(needle))
            })
            .map(|name| name.to_string())
    }

    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<Option<f64>>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;
        let casted = col.cast(&DataType::Float64).map_err(|e| {
            ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64: {}",
                column_name, e
            ))
        })?;

        Ok(casted.f64()?.into_iter().collect())
    }

    fn column_as_timestamps(
        df: &DataFrame,
        column_name: &str,
    ) -> Result<Vec<Option<DateTime<Utc>>>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;
        let as_text = col.cast(&DataType::Utf8)?;

        as_text
            .utf8()?
            .into_iter()
            .map(|value| value.map(parse_timestamp).transpose())
            .collect()
    }
}

/// Parse a date or date-time string into a UTC timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(ForecastError::DataError(format!(
        "Unrecognised timestamp '{}'",
        value
    )))
}

/// Generate a deterministic geometric random walk of daily closes
pub fn generate_random_walk(
    symbol: &str,
    len: usize,
    start_price: f64,
    drift: f64,
    volatility: f64,
    seed: u64,
) -> Result<PriceSeries> {
    if start_price <= 0.0 || !start_price.is_finite() {
        return Err(ForecastError::ValidationError(
            "Start price must be positive".to_string(),
        ));
    }
    if !volatility.is_finite() || volatility < 0.0 {
        return Err(ForecastError::ValidationError(format!(
            "Volatility must be a non-negative number, got {}",
            volatility
        )));
    }
    let normal = Normal::new(drift, volatility)
        .map_err(|e| ForecastError::ValidationError(format!("Invalid volatility: {}", e)))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start_price;
    let mut closes = Vec::with_capacity(len);
    for _ in 0..len {
        closes.push(price);
        price *= (1.0 + normal.sample(&mut rng)).max(0.01);
    }

    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).single().ok_or_else(|| {
        ForecastError::DataError("Invalid synthetic start date".to_string())
    })?;
    PriceSeries::from_closes(symbol, start, &closes)
}
