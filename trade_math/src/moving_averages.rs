//! Moving average calculations
//!
//! Contains:
//! - Simple Moving Average (SMA) as a streaming window
//! - Trailing mean over the tail of a slice, with a shorter-window fallback

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        })
    }

    /// Push a new value into the window, evicting the oldest once full
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "SMA input must be finite, got {}",
                value
            )));
        }

        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }

        Ok(())
    }

    /// Whether a full window of values has been observed
    pub fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if !self.is_ready() {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }
}

/// Mean of the last `window` entries of `values`.
///
/// When fewer than `window` entries exist, the mean is taken over all of them.
/// Fails only on an empty slice or a zero window.
pub fn trailing_mean(values: &[f64], window: usize) -> Result<f64> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot average an empty slice".to_string(),
        ));
    }

    let tail = &values[values.len().saturating_sub(window)..];
    Ok(tail.iter().sum::<f64>() / tail.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_calculation() {
        let mut sma = SimpleMovingAverage::new(3).unwrap();

        assert!(sma.value().is_err());

        sma.update(2.0).unwrap();
        sma.update(4.0).unwrap();

        // Still not enough data
        assert!(sma.value().is_err());
        assert!(!sma.is_ready());

        sma.update(6.0).unwrap();
        assert_eq!(sma.value().unwrap(), 4.0);

        // The window slides, dropping the oldest value
        sma.update(8.0).unwrap();
        assert_eq!(sma.value().unwrap(), 6.0);
    }

    #[test]
    fn test_sma_rejects_bad_input() {
        assert!(SimpleMovingAverage::new(0).is_err());

        let mut sma = SimpleMovingAverage::new(2).unwrap();
        assert!(sma.update(f64::NAN).is_err());
    }

    #[test]
    fn test_sma_single_period() {
        let mut sma = SimpleMovingAverage::new(1).unwrap();
        sma.update(5.0).unwrap();
        assert_eq!(sma.value().unwrap(), 5.0);

        sma.update(7.0).unwrap();
        assert_eq!(sma.value().unwrap(), 7.0);
        assert_eq!(sma.period(), 1);
    }

    #[test]
    fn test_trailing_mean_full_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(trailing_mean(&values, 2).unwrap(), 4.5);
        assert_eq!(trailing_mean(&values, 5).unwrap(), 3.0);
    }

    #[test]
    fn test_trailing_mean_shorter_than_window() {
        // Three values, window of five: mean over all three
        let values = [10.0, 20.0, 30.0];
        assert_eq!(trailing_mean(&values, 5).unwrap(), 20.0);
    }

    #[test]
    fn test_trailing_mean_errors() {
        assert!(trailing_mean(&[], 3).is_err());
        assert!(trailing_mean(&[1.0], 0).is_err());
    }
}
