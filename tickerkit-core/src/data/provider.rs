//! Price provider trait and its structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, a
//! directory of CSV files) so the retrieval adapter can swap them and tests can
//! mock them. Providers own retries, auth and rate limiting; the adapter only
//! sequences validation around `fetch`.

use crate::domain::PriceTable;
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for provider operations.
///
/// These are designed to be displayable in CLI output.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("provider error: {0}")]
    Other(String),
}

/// A source of historical price tables.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch a price table for `symbol` over `[start, end)` at `interval`.
    ///
    /// `Ok(None)` (or an empty table) means the provider has nothing for the
    /// request. `interval` is provider-specific and passed through untouched.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Option<PriceTable>, ProviderError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}
