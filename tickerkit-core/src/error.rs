//! Error taxonomy for the price-series pipeline.
//!
//! Every validation failure maps to exactly one variant so callers can match
//! on the failure mode instead of parsing messages.

use crate::data::provider::ProviderError;
use thiserror::Error;

/// Errors raised by the validation gate, the transforms and the retrieval adapter.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("invalid date string: {value:?}, expected format 'YYYY-MM-DD'")]
    InvalidDateFormat { value: String },

    #[error("no data: input has no rows")]
    EmptyData,

    #[error("no data returned for symbol: {symbol:?}")]
    NoDataReturned { symbol: String },

    #[error("invalid index: {0}")]
    InvalidIndex(String),

    #[error("wrong type: {0}")]
    WrongType(String),

    #[error("series contains only missing values")]
    AllMissing,

    #[error("window must be a positive integer, got {0}")]
    NonPositiveWindow(i64),

    #[error("unsupported return method: {0:?}, use 'simple' or 'log'")]
    UnsupportedMethod(String),

    #[error("unsupported aggregation: {0:?}, use 'last', 'first' or 'mean'")]
    UnsupportedAggregation(String),

    #[error("unsupported resample frequency: {0:?}")]
    UnsupportedFrequency(String),

    #[error("table must contain either 'Adj Close' or 'Close' column")]
    MissingCloseColumn,

    #[error("at least one valid symbol must be provided")]
    NoValidSymbols,

    #[error("index has {index} entries but values have {values}")]
    LengthMismatch { index: usize, values: usize },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("frame error: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolkitError {
    /// True for both `EmptyData` and its per-symbol form `NoDataReturned`.
    pub fn is_empty_data(&self) -> bool {
        matches!(self, Self::EmptyData | Self::NoDataReturned { .. })
    }
}

pub type Result<T, E = ToolkitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_returned_counts_as_empty_data() {
        let err = ToolkitError::NoDataReturned {
            symbol: "AAPL".into(),
        };
        assert!(err.is_empty_data());
        assert!(ToolkitError::EmptyData.is_empty_data());
        assert!(!ToolkitError::AllMissing.is_empty_data());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ToolkitError::InvalidDateFormat {
            value: "2024/01/01".into(),
        };
        assert!(err.to_string().contains("2024/01/01"));

        let err = ToolkitError::NoDataReturned {
            symbol: "MSFT".into(),
        };
        assert!(err.to_string().contains("MSFT"));
    }

    #[test]
    fn provider_errors_convert() {
        let err: ToolkitError = ProviderError::CircuitBreakerTripped.into();
        assert!(matches!(err, ToolkitError::Provider(_)));
    }
}
