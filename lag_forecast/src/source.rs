//! Price history providers

use crate::data::{DataLoader, Interval, Period, PriceBar, PriceSeries};
use crate::error::{ForecastError, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Supplies historical bars for a symbol
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the bars for `symbol` covering `period` at `interval`.
    ///
    /// Fails with `NoData` when nothing comes back.
    async fn get_price_series(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries>;

    /// Source name for logs
    fn name(&self) -> &str;
}

fn no_data(symbol: &str, period: Period, interval: Interval) -> ForecastError {
    ForecastError::NoData {
        symbol: symbol.to_string(),
        period: period.to_string(),
        interval: interval.to_string(),
    }
}

/// Yahoo Finance chart endpoint
#[derive(Debug, Clone)]
pub struct YahooPriceSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooPriceSource {
    /// Create a source against the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    /// Create a source against a different chart endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("lag_forecast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn parse_chart(
        symbol: &str,
        period: Period,
        interval: Interval,
        envelope: ChartEnvelope,
    ) -> Result<PriceSeries> {
        if let Some(error) = envelope.chart.error {
            warn!(
                symbol,
                code = %error.code,
                description = error.description.as_deref().unwrap_or(""),
                "chart request returned an error"
            );
            return Err(no_data(symbol, period, interval));
        }

        let result = envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| no_data(symbol, period, interval))?;
        let quote = result.indicators.quote.into_iter().next().unwrap_or(Quote {
            open: Vec::new(),
            close: Vec::new(),
        });

        let mut bars = Vec::with_capacity(result.timestamp.len());
        let mut skipped = 0usize;
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let close = quote.close.get(i).copied().flatten();
            let timestamp = Utc.timestamp_opt(ts, 0).single();
            match (timestamp, close) {
                (Some(timestamp), Some(close)) => {
                    let open = quote.open.get(i).copied().flatten().unwrap_or(close);
                    bars.push(PriceBar::new(timestamp, open, close));
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(symbol, skipped, "skipped bars without a close");
        }
        if bars.is_empty() {
            return Err(no_data(symbol, period, interval));
        }

        PriceSeries::new(symbol, bars)
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    async fn get_price_series(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries> {
        let url = format!("{}/{}", self.base_url, symbol);
        debug!(%url, %period, %interval, "requesting chart");

        let response = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", interval.as_str())])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(no_data(symbol, period, interval));
        }

        let envelope: ChartEnvelope = response.error_for_status()?.json().await?;
        let series = Self::parse_chart(symbol, period, interval, envelope)?;
        info!(symbol, bars = series.len(), "downloaded price history");
        Ok(series)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// Directory of `<SYMBOL>.csv` files
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    directory: PathBuf,
}

impl CsvPriceSource {
    /// Read files from `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.directory.join(format!("{}.csv", symbol))
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn get_price_series(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(no_data(symbol, period, interval));
        }
        if interval != Interval::Daily {
            debug!(symbol, %interval, "csv bars are used at their stored interval");
        }

        let owned_symbol = symbol.to_string();
        let series = tokio::task::spawn_blocking(move || DataLoader::from_csv(&owned_symbol, path))
            .await
            .map_err(|e| ForecastError::DataError(format!("CSV reader task failed: {}", e)))??
            .within(period);

        if series.is_empty() {
            return Err(no_data(symbol, period, interval));
        }
        info!(symbol, bars = series.len(), "loaded price history from csv");
        Ok(series)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Fixed series per symbol
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, PriceSeries>,
}

impl InMemoryPriceSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under its own symbol
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.symbol().to_string(), series);
        self
    }
}

#[async_trait]
impl PriceSource for InMemoryPriceSource {
    async fn get_price_series(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries> {
        match self.series.get(symbol) {
            Some(series) => {
                let windowed = series.within(period);
                if windowed.is_empty() {
                    Err(no_data(symbol, period, interval))
                } else {
                    Ok(windowed)
                }
            }
            None => Err(no_data(symbol, period, interval)),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}
