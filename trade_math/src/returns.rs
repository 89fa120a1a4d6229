//! Simple (arithmetic) returns

use crate::{MathError, Result};

/// One-step simple return `(current - previous) / previous`
pub fn simple_return(previous: f64, current: f64) -> Result<f64> {
    if previous == 0.0 {
        return Err(MathError::CalculationError(
            "Cannot compute a return from a zero previous price".to_string(),
        ));
    }

    Ok((current - previous) / previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_return() {
        assert_eq!(simple_return(100.0, 105.0).unwrap(), 0.05);
        assert_eq!(simple_return(100.0, 100.0).unwrap(), 0.0);
        assert!(simple_return(0.0, 1.0).is_err());
    }
}
