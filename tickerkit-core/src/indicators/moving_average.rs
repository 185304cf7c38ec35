//! Simple Moving Average over a trailing window of points.
//!
//! Lookback: window - 1 (first value at index window-1).

use super::rolling_apply;
use crate::domain::{PriceSeries, Window};
use crate::error::Result;
use crate::validation::validate_price_series;

pub fn moving_average(series: &PriceSeries, window: Window) -> Result<PriceSeries> {
    validate_price_series(series)?;
    Ok(rolling_apply(series, window, |w| {
        Some(w.iter().sum::<f64>() / w.len() as f64)
    }))
}
