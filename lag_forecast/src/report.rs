//! Profit/loss report for a forecast path in two currencies

use crate::error::{ForecastError, Result};
use crate::forecaster::ForecastPath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Fixed conversion from the quote currency to a display currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConversion {
    /// Currency prices are quoted in
    pub from: String,
    /// Currency to display alongside
    pub to: String,
    /// Units of `to` per unit of `from`
    pub rate: f64,
}

impl CurrencyConversion {
    /// Create a validated conversion
    pub fn new(from: impl Into<String>, to: impl Into<String>, rate: f64) -> Result<Self> {
        let conversion = Self {
            from: from.into(),
            to: to.into(),
            rate,
        };
        conversion.validate()?;
        Ok(conversion)
    }

    /// Rate must be positive and finite, currency codes non-empty
    pub fn validate(&self) -> Result<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ForecastError::ValidationError(format!(
                "Conversion rate must be a positive number, got {}",
                self.rate
            )));
        }
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Err(ForecastError::ValidationError(
                "Currency codes must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert an amount
    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

impl Default for CurrencyConversion {
    fn default() -> Self {
        Self {
            from: "USD".to_string(),
            to: "INR".to_string(),
            rate: 90.0,
        }
    }
}

/// Direction of a predicted move against the current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Profit,
    Loss,
    NoChange,
}

impl Outcome {
    /// Classify a price delta; deltas within `tolerance` of zero count as no change.
    ///
    /// A tolerance of 0.0 means only an exact zero is no change.
    pub fn classify(delta: f64, tolerance: f64) -> Self {
        if delta.abs() <= tolerance {
            Outcome::NoChange
        } else if delta > 0.0 {
            Outcome::Profit
        } else {
            Outcome::Loss
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Profit => "PROFIT",
            Outcome::Loss => "LOSS",
            Outcome::NoChange => "NO CHANGE",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outlook for one forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOutlook {
    /// Day offset from today, starting at 1
    pub day: usize,
    /// Predicted close in the quote currency
    pub predicted: f64,
    /// Predicted close in the display currency
    pub predicted_converted: f64,
    /// Predicted minus current, quote currency
    pub change: f64,
    /// Predicted minus current, display currency
    pub change_converted: f64,
    /// Change as a percentage of the current price
    pub change_pct: f64,
    /// Profit, loss, or no change
    pub outcome: Outcome,
}

/// Per-day profit/loss against the current price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Instrument symbol
    pub symbol: String,
    /// Last real close, quote currency
    pub current_price: f64,
    /// Last real close, display currency
    pub current_price_converted: f64,
    /// Conversion used for display amounts
    pub conversion: CurrencyConversion,
    /// One entry per forecast day
    pub days: Vec<DayOutlook>,
}

impl ForecastReport {
    /// Build a report for `path` relative to `current_price`
    pub fn new(
        symbol: impl Into<String>,
        current_price: f64,
        path: &ForecastPath,
        conversion: &CurrencyConversion,
        no_change_tolerance: f64,
    ) -> Result<Self> {
        conversion.validate()?;
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(ForecastError::ValidationError(format!(
                "Current price must be positive, got {}",
                current_price
            )));
        }
        if no_change_tolerance.is_nan() || no_change_tolerance < 0.0 {
            return Err(ForecastError::ValidationError(format!(
                "No-change tolerance must be non-negative, got {}",
                no_change_tolerance
            )));
        }

        let current_converted = conversion.convert(current_price);
        let days = path
            .values()
            .iter()
            .enumerate()
            .map(|(i, &predicted)| {
                let predicted_converted = conversion.convert(predicted);
                let change = predicted - current_price;
                DayOutlook {
                    day: i + 1,
                    predicted,
                    predicted_converted,
                    change,
                    change_converted: predicted_converted - current_converted,
                    change_pct: change / current_price * 100.0,
                    outcome: Outcome::classify(change, no_change_tolerance),
                }
            })
            .collect();

        Ok(Self {
            symbol: symbol.into(),
            current_price,
            current_price_converted: current_converted,
            conversion: conversion.clone(),
            days,
        })
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write one CSV row per day
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "day",
            "predicted",
            "predicted_converted",
            "change",
            "change_converted",
            "change_pct",
            "outcome",
        ])?;
        for day in &self.days {
            csv.write_record([
                day.day.to_string(),
                format!("{:.4}", day.predicted),
                format!("{:.4}", day.predicted_converted),
                format!("{:.4}", day.change),
                format!("{:.4}", day.change_converted),
                format!("{:.4}", day.change_pct),
                day.outcome.label().to_string(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = &self.conversion.from;
        let to = &self.conversion.to;

        writeln!(f, "PREDICTIONS FOR {}", self.symbol)?;
        writeln!(
            f,
            "Current Price: {:.2} {} | {:.2} {}",
            self.current_price, from, self.current_price_converted, to
        )?;
        for day in &self.days {
            writeln!(f)?;
            writeln!(f, "Day +{}: {}", day.day, day.outcome)?;
            writeln!(
                f,
                "  Predicted: {:.2} {} | {:.2} {}",
                day.predicted, from, day.predicted_converted, to
            )?;
            writeln!(
                f,
                "  P/L: {:+.2} {} | {:+.2} {} ({:+.2}%)",
                day.change, from, day.change_converted, to, day.change_pct
            )?;
        }
        Ok(())
    }
}
