//! Tickerkit Core: validated price-series pipeline.
//!
//! This crate contains:
//! - Domain types (price tables, time series, symbol sets, windows)
//! - The validation gate applied at every boundary
//! - Series transforms: returns, moving average, rolling volatility
//! - Tabular preprocessing: close extraction and calendar resampling
//! - The retrieval adapter and its providers (Yahoo, CSV directory)
//! - Chart payloads and TOML configuration

pub mod chart;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod preprocess;
pub mod validation;

pub use error::{Result, ToolkitError};
