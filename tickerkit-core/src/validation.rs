//! Validation gate.
//!
//! Pure checks run at every boundary before numeric code sees the data. Each
//! failure mode has its own [`ToolkitError`] variant.

use crate::domain::{PriceSeries, PriceTable, SymbolSet, SymbolSource, Window};
use crate::error::{Result, ToolkitError};
use chrono::NaiveDate;

/// Check that `s` is exactly `YYYY-MM-DD` and names a real calendar date.
///
/// Returns the parsed date. Signs, single-digit fields, other separators and
/// any time or zone suffix are rejected.
pub fn validate_date_string(s: &str) -> Result<NaiveDate> {
    let invalid = || ToolkitError::InvalidDateFormat {
        value: s.to_string(),
    };

    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Check that a table has data and a non-decreasing timestamp index.
///
/// When `symbol` is given, an empty table is reported as
/// [`ToolkitError::NoDataReturned`] naming it.
pub fn validate_price_table(table: &PriceTable, symbol: Option<&str>) -> Result<()> {
    if table.is_empty() {
        return Err(match symbol {
            Some(symbol) => ToolkitError::NoDataReturned {
                symbol: symbol.to_string(),
            },
            None => ToolkitError::EmptyData,
        });
    }
    if !table.is_index_monotonic() {
        return Err(ToolkitError::InvalidIndex(
            "table index must be sorted by timestamp".into(),
        ));
    }
    Ok(())
}

/// Check that a series is non-empty, time-ordered and not entirely missing.
pub fn validate_price_series(series: &PriceSeries) -> Result<()> {
    if series.is_empty() {
        return Err(ToolkitError::EmptyData);
    }
    if !series.is_index_monotonic() {
        return Err(ToolkitError::InvalidIndex(
            "series index must be sorted by timestamp".into(),
        ));
    }
    if series.values().iter().all(Option::is_none) {
        return Err(ToolkitError::AllMissing);
    }
    Ok(())
}

/// Validate a window given as a dynamic value (JSON or TOML config).
///
/// Only integers are accepted; a float is rejected even if it is whole.
pub fn validate_window(value: &serde_json::Value) -> Result<Window> {
    match value {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(size) => Window::new(size),
            None if n.is_u64() => Err(ToolkitError::WrongType(format!(
                "window {n} is too large"
            ))),
            None => Err(ToolkitError::WrongType(format!(
                "window must be an integer, got float {n}"
            ))),
        },
        other => Err(ToolkitError::WrongType(format!(
            "window must be an integer, got {}",
            json_type_name(other)
        ))),
    }
}

/// Normalize symbols: trim, uppercase, drop blanks. Order and duplicates are kept.
pub fn validate_symbols(input: impl SymbolSource) -> Result<SymbolSet> {
    let symbols: Vec<String> = input
        .candidates()
        .into_iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ToolkitError::NoValidSymbols);
    }
    Ok(SymbolSet::from_normalized(symbols))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
