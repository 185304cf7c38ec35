//! Yahoo Finance price provider.
//!
//! Fetches OHLCV tables from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV directory provider is the fallback when Yahoo is unavailable.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{PriceProvider, ProviderError};
use crate::config::ProviderSettings;
use crate::domain::{columns, PriceTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: CircuitBreaker,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker: CircuitBreaker::new(
                Duration::from_secs(settings.breaker_cooldown_secs),
                settings.breaker_failure_threshold,
            ),
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
        })
    }

    /// Build the chart API URL. `end` is exclusive.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate, interval: &str) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{BASE_URL}/{symbol}?period1={start_ts}&period2={end_ts}&interval={interval}\
             &includeAdjustedClose=true"
        )
    }

    /// Parse the chart API response into a table. `None` if Yahoo has no rows.
    fn parse_response(
        symbol: &str,
        interval: &str,
        resp: ChartResponse,
    ) -> Result<Option<PriceTable>, ProviderError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                tracing::debug!(symbol, "symbol not found on yahoo");
                return Ok(None);
            }
            (None, Some(err)) => {
                return Err(ProviderError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(ProviderError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(None);
        };
        let Some(timestamps) = data.timestamp else {
            return Ok(None);
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let intraday = is_intraday(interval);

        let mut index: Vec<NaiveDateTime> = Vec::with_capacity(timestamps.len());
        let mut open = Vec::with_capacity(timestamps.len());
        let mut high = Vec::with_capacity(timestamps.len());
        let mut low = Vec::with_capacity(timestamps.len());
        let mut close = Vec::with_capacity(timestamps.len());
        let mut volume = Vec::with_capacity(timestamps.len());
        let mut adj_close = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let stamp = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    ProviderError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let row = [
                value_at(&quote.open, i),
                value_at(&quote.high, i),
                value_at(&quote.low, i),
                value_at(&quote.close, i),
                value_at(&quote.volume, i),
            ];
            // Holidays and non-trading days come back as all-null rows
            if row.iter().all(Option::is_none) {
                continue;
            }

            index.push(if intraday {
                stamp
            } else {
                stamp.date().and_time(NaiveTime::MIN)
            });
            open.push(row[0]);
            high.push(row[1]);
            low.push(row[2]);
            close.push(row[3]);
            volume.push(row[4]);
            adj_close.push(adj_closes.as_deref().and_then(|v| value_at(v, i)));
        }

        if index.is_empty() {
            return Ok(None);
        }

        let mut table = PriceTable::new(index);
        let mut add = |name: &str, values: Vec<Option<f64>>| {
            table
                .insert_column(name, values)
                .map_err(|e| ProviderError::ResponseFormatChanged(e.to_string()))
        };
        add(columns::OPEN, open)?;
        add(columns::HIGH, high)?;
        add(columns::LOW, low)?;
        add(columns::CLOSE, close)?;
        if adj_closes.is_some() {
            add(columns::ADJ_CLOSE, adj_close)?;
        }
        add(columns::VOLUME, volume)?;

        tracing::debug!(symbol, rows = table.height(), "parsed yahoo chart response");
        Ok(Some(table))
    }

    /// Execute the request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Option<PriceTable>, ProviderError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(ProviderError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, start, end, interval);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::warn!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying yahoo request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(ProviderError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(ProviderError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(ProviderError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(ProviderError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(ProviderError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ProviderError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }

            // Yahoo answers unknown symbols with 404 and a JSON error body
            if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                self.circuit_breaker.record_failure();
                last_error = Some(ProviderError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                ProviderError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let table = Self::parse_response(symbol, interval, chart)?;
            self.circuit_breaker.record_success();
            return Ok(table);
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Other("max retries exceeded".into())))
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Option<PriceTable>, ProviderError> {
        if end <= start {
            tracing::debug!(symbol, %start, %end, "empty date range, skipping request");
            return Ok(None);
        }
        self.fetch_with_retry(symbol, start, end, interval)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Null, out-of-range and NaN entries are all missing.
fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|x| !x.is_nan())
}

/// Minute and hour intervals keep their time of day; `1d`, `1wk`, `1mo` do not.
fn is_intraday(interval: &str) -> bool {
    let interval = interval.trim();
    interval.ends_with('h') || (interval.ends_with('m') && !interval.ends_with("mo"))
}

/// Exponential backoff before retry `attempt` (1-based), saturating on overflow.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str, interval: &str) -> Result<Option<PriceTable>, ProviderError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("AAPL", interval, resp)
    }

    const DAILY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, null, 182.15],
                        "high": [188.44, null, 183.09],
                        "low": [183.89, null, 180.88],
                        "close": [185.64, null, 181.91],
                        "volume": [82488700, null, 71983600]
                    }],
                    "adjclose": [{ "adjclose": [184.94, null, 181.22] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_daily_rows_and_skips_null_rows() {
        let table = parse(DAILY, "1d").unwrap().unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.column_names(),
            vec!["Open", "High", "Low", "Close", "Adj Close", "Volume"]
        );
        assert_eq!(table.column("Adj Close").unwrap()[0], Some(184.94));
        assert_eq!(table.column("Volume").unwrap()[1], Some(71983600.0));
        // daily rows are stamped at midnight
        assert_eq!(
            table.index()[0],
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_time(NaiveTime::MIN)
        );
    }

    #[test]
    fn intraday_keeps_time_of_day() {
        let table = parse(DAILY, "1h").unwrap().unwrap();
        assert_ne!(table.index()[0].time(), NaiveTime::MIN);
    }

    #[test]
    fn not_found_is_no_data() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse(json, "1d").unwrap().is_none());
    }

    #[test]
    fn other_errors_are_format_changes() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(
            parse(json, "1d"),
            Err(ProviderError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn missing_timestamps_is_no_data() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse(json, "1d").unwrap().is_none());
    }

    #[test]
    fn no_adjclose_block_means_no_adj_column() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800],"indicators":{"quote":[{"close":[1.0]}]}}],"error":null}}"#;
        let table = parse(json, "1d").unwrap().unwrap();
        assert!(!table.has_column("Adj Close"));
        assert_eq!(table.column("Close").unwrap()[0], Some(1.0));
        assert_eq!(table.column("Open").unwrap()[0], None);
    }

    #[test]
    fn url_passes_interval_through() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let url = YahooProvider::chart_url("AAPL", start, end, "1wk");
        assert!(url.contains("/AAPL?"));
        assert!(url.contains("interval=1wk"));
        assert!(url.contains("period1=1704067200"));
    }

    #[test]
    fn intraday_detection() {
        assert!(is_intraday("5m"));
        assert!(is_intraday("1h"));
        assert!(!is_intraday("1d"));
        assert!(!is_intraday("1wk"));
        assert!(!is_intraday("1mo"));
    }

    #[test]
    fn reversed_range_skips_request() {
        let provider = YahooProvider::new(&ProviderSettings::default()).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(provider.fetch("AAPL", start, end, "1d").unwrap().is_none());
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(2000));
        // large retry counts from config must not overflow
        assert_eq!(backoff_delay(base, 40), base.saturating_mul(u32::MAX));
        assert_eq!(backoff_delay(Duration::MAX, 5), Duration::MAX);
    }
}
