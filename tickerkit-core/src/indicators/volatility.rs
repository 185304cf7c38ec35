//! Rolling volatility: sample standard deviation over a trailing window.
//!
//! Uses Bessel's correction (divide by window - 1), so a window of one point
//! has no defined value.

use super::rolling_apply;
use crate::domain::{PriceSeries, Window};
use crate::error::Result;
use crate::validation::validate_price_series;

/// Usually applied to a return series, but any valid numeric series works.
pub fn rolling_volatility(series: &PriceSeries, window: Window) -> Result<PriceSeries> {
    validate_price_series(series)?;
    Ok(rolling_apply(series, window, sample_std))
}

fn sample_std(window: &[f64]) -> Option<f64> {
    let n = window.len();
    if n < 2 {
        return None;
    }
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;
    Some(variance.sqrt())
}
