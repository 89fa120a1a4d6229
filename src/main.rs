//! `stock-forecast`: fetch a symbol's history, fit a lag-feature regressor and
//! print a multi-day profit/loss outlook.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use lag_forecast::data::generate_random_walk;
use lag_forecast::{
    CsvPriceSource, CurrencyConversion, FeatureConfig, ForecastConfig, InMemoryPriceSource,
    Interval, Period, Pipeline, PipelineOutcome, PriceSource, RegressorKind, YahooPriceSource,
};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "stock-forecast", version, about = "Forecast the next closes of a stock", long_about = None)]
struct Cli {
    /// Ticker symbol, e.g. AAPL or RELIANCE.NS
    ticker: Option<String>,

    /// TOML file with a full configuration; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// History look-back (1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)
    #[arg(short, long)]
    period: Option<Period>,

    /// Bar interval (1d, 5d, 1wk, 1mo)
    #[arg(short, long)]
    interval: Option<Interval>,

    /// Days to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Number of lag features
    #[arg(long)]
    n_lags: Option<usize>,

    /// Rolling-mean windows, comma separated
    #[arg(long, value_delimiter = ',')]
    ma_windows: Option<Vec<usize>>,

    /// Regressor (random_forest, linear)
    #[arg(long)]
    regressor: Option<RegressorKind>,

    /// Trees in the random forest
    #[arg(long)]
    trees: Option<usize>,

    /// Seed for the random forest
    #[arg(long)]
    seed: Option<u64>,

    /// Quote currency code
    #[arg(long)]
    from_currency: Option<String>,

    /// Display currency code
    #[arg(long)]
    to_currency: Option<String>,

    /// Display-currency units per quote-currency unit
    #[arg(long)]
    rate: Option<f64>,

    /// Moves within this distance of zero are reported as no change
    #[arg(long)]
    tolerance: Option<f64>,

    /// Read `<TICKER>.csv` files from this directory instead of downloading
    #[arg(long, conflicts_with = "synthetic")]
    csv_dir: Option<PathBuf>,

    /// Use a seeded random walk of this many bars instead of downloading
    #[arg(long)]
    synthetic: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(ForecastConfig, SourceChoice, OutputFormat)> {
        let mut config = match &self.config {
            Some(path) => ForecastConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ForecastConfig::default(),
        };

        if let Some(ticker) = &self.ticker {
            config.ticker = ticker.trim().to_uppercase();
        }
        if let Some(period) = self.period {
            config.period = period;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if self.n_lags.is_some() || self.ma_windows.is_some() {
            config.features = FeatureConfig::new(
                self.n_lags.unwrap_or(config.features.n_lags),
                self.ma_windows
                    .clone()
                    .unwrap_or_else(|| config.features.ma_windows.iter().copied().collect()),
            )?;
        }
        if let Some(regressor) = self.regressor {
            config.regressor = regressor;
        }
        if let Some(trees) = self.trees {
            config.forest.n_trees = trees;
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
        }
        if self.from_currency.is_some() || self.to_currency.is_some() || self.rate.is_some() {
            config.conversion = CurrencyConversion::new(
                self.from_currency
                    .clone()
                    .unwrap_or_else(|| config.conversion.from.clone()),
                self.to_currency
                    .clone()
                    .unwrap_or_else(|| config.conversion.to.clone()),
                self.rate.unwrap_or(config.conversion.rate),
            )?;
        }
        if let Some(tolerance) = self.tolerance {
            config.no_change_tolerance = tolerance;
        }

        let source = match (self.csv_dir, self.synthetic) {
            (Some(dir), _) => SourceChoice::Csv(dir),
            (None, Some(len)) => SourceChoice::Synthetic(len),
            (None, None) => SourceChoice::Yahoo,
        };
        Ok((config, source, self.output))
    }
}

#[derive(Debug)]
enum SourceChoice {
    Yahoo,
    Csv(PathBuf),
    Synthetic(usize),
}

impl SourceChoice {
    fn build(&self, ticker: &str) -> anyhow::Result<Box<dyn PriceSource>> {
        Ok(match self {
            SourceChoice::Yahoo => Box::new(YahooPriceSource::new()?),
            SourceChoice::Csv(dir) => Box::new(CsvPriceSource::new(dir.clone())),
            SourceChoice::Synthetic(len) => {
                let series = generate_random_walk(ticker, *len, 100.0, 0.0005, 0.015, 42)?;
                Box::new(InMemoryPriceSource::new().with_series(series))
            }
        })
    }
}

fn print_outcome(outcome: &PipelineOutcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Model: {} ({} bars)", outcome.model, outcome.bars);
            println!(
                "Train samples: {}, evaluation samples: {}",
                outcome.train_samples, outcome.eval_samples
            );
            println!("{}", outcome.metrics);
            println!();
            print!("{}", outcome.report);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Csv => {
            outcome.report.write_csv(io::stdout().lock())?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let (config, source, format) = Cli::parse().into_config()?;
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let ticker = pipeline.config().ticker.clone();
    let source = source.build(&ticker)?;

    let outcome = pipeline
        .run(&*source)
        .await
        .with_context(|| format!("forecast for {} failed", ticker))?;
    tracing::info!(symbol = %outcome.symbol, days = outcome.path.len(), "done");

    print_outcome(&outcome, format)
}
