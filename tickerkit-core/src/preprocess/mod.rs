//! Tabular preprocessing: close-price extraction and calendar resampling.

pub mod close;
pub mod resample;

pub use close::{extract_close_series, CLOSE_SERIES_NAME};
pub use resample::{resample, Aggregation, Frequency};
