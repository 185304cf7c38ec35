//! Period-over-period returns.
//!
//! Simple: `(v[i] - v[i-1]) / v[i-1]`. Log: `ln(v[i] / v[i-1])`.
//! The first observation has no predecessor and is dropped, so the output is
//! one shorter than the input and indexed by the input's timestamps `1..n`.

use crate::domain::{PriceSeries, TimeSeries};
use crate::error::{Result, ToolkitError};
use crate::validation::validate_price_series;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How consecutive prices are turned into a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReturnMethod {
    #[default]
    Simple,
    Log,
}

impl ReturnMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnMethod::Simple => "simple",
            ReturnMethod::Log => "log",
        }
    }

    fn apply(self, prev: f64, cur: f64) -> f64 {
        match self {
            ReturnMethod::Simple => (cur - prev) / prev,
            ReturnMethod::Log => (cur / prev).ln(),
        }
    }
}

impl fmt::Display for ReturnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: only `"simple"` and `"log"` are recognized.
impl FromStr for ReturnMethod {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(ReturnMethod::Simple),
            "log" => Ok(ReturnMethod::Log),
            other => Err(ToolkitError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl TryFrom<String> for ReturnMethod {
    type Error = ToolkitError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ReturnMethod> for String {
    fn from(method: ReturnMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Compute returns of a price series.
///
/// A pair with a missing operand yields a missing return. A zero predecessor
/// yields whatever IEEE-754 division gives (`inf` or NaN).
pub fn compute_returns(series: &PriceSeries, method: ReturnMethod) -> Result<PriceSeries> {
    validate_price_series(series)?;

    let values = series.values();
    let points = series.index()[1..].iter().copied().zip(
        values
            .windows(2)
            .map(|pair| match (pair[0], pair[1]) {
                (Some(prev), Some(cur)) => Some(method.apply(prev, cur)),
                _ => None,
            }),
    );

    let returns = TimeSeries::from_points(points);
    Ok(match series.name() {
        Some(name) => returns.with_name(name),
        None => returns,
    })
}
