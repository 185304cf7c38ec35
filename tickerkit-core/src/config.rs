//! TOML configuration.
//!
//! Every section is optional. Values that need validation (dates, symbols,
//! windows, method and aggregation names) are checked either during
//! deserialization or through the validation gate when accessed. Accessor
//! failures carry the same error kinds as a bad function argument, wrapped in
//! [`ConfigError::Invalid`].

use crate::domain::{SymbolSet, Window};
use crate::error::ToolkitError;
use crate::indicators::ReturnMethod;
use crate::preprocess::{Aggregation, Frequency};
use crate::validation::{validate_date_string, validate_symbols};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ToolkitError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub fetch: FetchSettings,
    pub analysis: AnalysisSettings,
    pub resample: ResampleSettings,
    pub provider: ProviderSettings,
}

impl ToolkitConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// What to retrieve.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// A single ticker or a list; non-string entries are ignored.
    pub symbols: serde_json::Value,
    pub start: Option<String>,
    pub end: Option<String>,
    pub interval: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            symbols: serde_json::Value::Null,
            start: None,
            end: None,
            interval: "1d".into(),
        }
    }
}

impl FetchSettings {
    pub fn symbol_set(&self) -> Result<SymbolSet, ConfigError> {
        Ok(validate_symbols(&self.symbols)?)
    }

    pub fn start_date(&self) -> Result<Option<NaiveDate>, ConfigError> {
        Ok(self.start.as_deref().map(validate_date_string).transpose()?)
    }

    pub fn end_date(&self) -> Result<Option<NaiveDate>, ConfigError> {
        Ok(self.end.as_deref().map(validate_date_string).transpose()?)
    }
}

/// Which series to derive.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub prefer_adjusted: bool,
    pub return_method: ReturnMethod,
    pub ma_windows: Vec<Window>,
    pub volatility_window: Option<Window>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            prefer_adjusted: true,
            return_method: ReturnMethod::Simple,
            ma_windows: Vec::new(),
            volatility_window: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResampleSettings {
    pub frequency: Frequency,
    pub aggregation: Aggregation,
}

/// Remote provider behavior: timeouts, retries and the circuit breaker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub breaker_cooldown_secs: u64,
    pub breaker_failure_threshold: u32,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            breaker_cooldown_secs: 30 * 60,
            breaker_failure_threshold: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}
