//! Retrieval adapter: sequences validation around a provider fetch.

use super::provider::PriceProvider;
use crate::domain::{PriceTable, SymbolSource};
use crate::error::{Result, ToolkitError};
use crate::validation::{validate_date_string, validate_price_table, validate_symbols};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Fetch one symbol's table over `[start, end)`.
///
/// The symbol is trimmed and uppercased before the provider sees it. A
/// provider returning nothing (or an empty table) yields `NoDataReturned`.
pub fn fetch_single(
    provider: &dyn PriceProvider,
    symbol: &str,
    start: &str,
    end: &str,
    interval: &str,
) -> Result<PriceTable> {
    let symbols = validate_symbols(symbol)?;
    let start = validate_date_string(start)?;
    let end = validate_date_string(end)?;
    fetch_validated(provider, symbols.first(), start, end, interval)
}

/// Fetch every symbol in order, stopping at the first failure.
///
/// Symbols are normalized and deduplicated by the returned map's keys; dates
/// are validated once before any request is made.
pub fn fetch_multiple(
    provider: &dyn PriceProvider,
    symbols: impl SymbolSource,
    start: &str,
    end: &str,
    interval: &str,
) -> Result<BTreeMap<String, PriceTable>> {
    let symbols = validate_symbols(symbols)?;
    let start = validate_date_string(start)?;
    let end = validate_date_string(end)?;

    tracing::info!(
        provider = provider.name(),
        count = symbols.len(),
        %start,
        %end,
        interval,
        "fetching symbols"
    );

    let mut tables = BTreeMap::new();
    for symbol in &symbols {
        let table = fetch_validated(provider, symbol, start, end, interval)?;
        tables.insert(symbol.clone(), table);
    }
    Ok(tables)
}

fn fetch_validated(
    provider: &dyn PriceProvider,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    interval: &str,
) -> Result<PriceTable> {
    tracing::debug!(provider = provider.name(), symbol, %start, %end, interval, "fetch");
    let table = provider
        .fetch(symbol, start, end, interval)?
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ToolkitError::NoDataReturned {
            symbol: symbol.to_string(),
        })?;
    validate_price_table(&table, Some(symbol))?;
    tracing::info!(symbol, rows = table.height(), columns = table.width(), "fetched");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::ProviderError;
    use crate::domain::test_support::make_table;
    use std::sync::Mutex;

    /// Serves a fixed table for known symbols and records every call.
    struct MockProvider {
        known: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl MockProvider {
        fn new(known: Vec<&'static str>) -> Self {
            Self {
                known,
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PriceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn fetch(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
            _interval: &str,
        ) -> Result<Option<PriceTable>, ProviderError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            if self.fail_on == Some(symbol) {
                return Err(ProviderError::NetworkUnreachable("down".into()));
            }
            if self.known.contains(&symbol) {
                Ok(Some(make_table(&[("Close", &[1.0, 2.0, 3.0])])))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn single_normalizes_symbol() {
        let provider = MockProvider::new(vec!["AAPL"]);
        let table = fetch_single(&provider, " aapl ", "2024-01-01", "2024-02-01", "1d").unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(provider.calls(), vec!["AAPL"]);
    }

    #[test]
    fn single_unknown_symbol_is_no_data() {
        let provider = MockProvider::new(vec![]);
        let err = fetch_single(&provider, "zzzz", "2024-01-01", "2024-02-01", "1d").unwrap_err();
        assert!(matches!(err, ToolkitError::NoDataReturned { ref symbol } if symbol == "ZZZZ"));
        assert!(err.is_empty_data());
    }

    #[test]
    fn single_bad_date_skips_provider() {
        let provider = MockProvider::new(vec!["AAPL"]);
        let err = fetch_single(&provider, "AAPL", "2024-13-01", "2024-02-01", "1d").unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidDateFormat { .. }));
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn single_blank_symbol_rejected() {
        let provider = MockProvider::new(vec![]);
        assert!(matches!(
            fetch_single(&provider, "   ", "2024-01-01", "2024-02-01", "1d"),
            Err(ToolkitError::NoValidSymbols)
        ));
    }

    #[test]
    fn multiple_fetches_in_order() {
        let provider = MockProvider::new(vec!["AAPL", "MSFT"]);
        let tables =
            fetch_multiple(&provider, vec!["msft", " aapl"], "2024-01-01", "2024-02-01", "1d").unwrap();
        assert_eq!(provider.calls(), vec!["MSFT", "AAPL"]);
        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn multiple_is_all_or_nothing() {
        let mut provider = MockProvider::new(vec!["AAPL", "MSFT", "GOOG"]);
        provider.fail_on = Some("MSFT");
        let err = fetch_multiple(
            &provider,
            ["AAPL", "MSFT", "GOOG"],
            "2024-01-01",
            "2024-02-01",
            "1d",
        )
        .unwrap_err();
        assert!(matches!(err, ToolkitError::Provider(ProviderError::NetworkUnreachable(_))));
        // GOOG is never requested
        assert_eq!(provider.calls(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn multiple_validates_dates_before_fetching() {
        let provider = MockProvider::new(vec!["AAPL"]);
        assert!(fetch_multiple(&provider, "AAPL", "2024-01-01", "Jan 5", "1d").is_err());
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn empty_table_counts_as_no_data() {
        struct EmptyProvider;
        impl PriceProvider for EmptyProvider {
            fn name(&self) -> &str {
                "empty"
            }
            fn fetch(
                &self,
                _symbol: &str,
                _start: NaiveDate,
                _end: NaiveDate,
                _interval: &str,
            ) -> Result<Option<PriceTable>, ProviderError> {
                Ok(Some(PriceTable::new(Vec::new())))
            }
        }
        assert!(matches!(
            fetch_single(&EmptyProvider, "SPY", "2024-01-01", "2024-02-01", "1d"),
            Err(ToolkitError::NoDataReturned { .. })
        ));
    }
}
