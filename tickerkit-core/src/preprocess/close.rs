//! Close-price extraction.

use crate::domain::{columns, PriceSeries, PriceTable};
use crate::error::{Result, ToolkitError};
use crate::validation::validate_price_table;

/// Name given to every extracted close series, whichever column it came from.
pub const CLOSE_SERIES_NAME: &str = "Close";

/// Pick the close-price column of a table as a series named `"Close"`.
///
/// With `prefer_adjusted`, `"Adj Close"` wins when present; otherwise
/// `"Close"` is used.
pub fn extract_close_series(table: &PriceTable, prefer_adjusted: bool) -> Result<PriceSeries> {
    validate_price_table(table, None)?;

    let source = if prefer_adjusted && table.has_column(columns::ADJ_CLOSE) {
        columns::ADJ_CLOSE
    } else if table.has_column(columns::CLOSE) {
        columns::CLOSE
    } else {
        return Err(ToolkitError::MissingCloseColumn);
    };

    let series = table
        .column_series(source)
        .ok_or(ToolkitError::MissingCloseColumn)?;
    Ok(series.with_name(CLOSE_SERIES_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::make_table;

    #[test]
    fn prefers_adj_close() {
        let table = make_table(&[
            ("Adj Close", &[10.0, 10.5, 11.0]),
            ("Close", &[9.0, 9.5, 10.0]),
        ]);
        let series = extract_close_series(&table, true).unwrap();
        assert_eq!(series.values(), &[Some(10.0), Some(10.5), Some(11.0)]);
        assert_eq!(series.name(), Some("Close"));
        assert_eq!(series.index(), table.index());
    }

    #[test]
    fn unadjusted_when_not_preferred() {
        let table = make_table(&[
            ("Adj Close", &[10.0, 10.5, 11.0]),
            ("Close", &[9.0, 9.5, 10.0]),
        ]);
        let series = extract_close_series(&table, false).unwrap();
        assert_eq!(series.values(), &[Some(9.0), Some(9.5), Some(10.0)]);
    }

    #[test]
    fn uses_close_if_no_adj() {
        let table = make_table(&[("Close", &[9.0, 9.5, 10.0])]);
        let series = extract_close_series(&table, true).unwrap();
        assert_eq!(series.values(), &[Some(9.0), Some(9.5), Some(10.0)]);
        assert_eq!(series.name(), Some("Close"));
    }

    #[test]
    fn adj_close_alone_without_preference_is_missing() {
        let table = make_table(&[("Adj Close", &[10.0, 10.5, 11.0])]);
        assert!(matches!(
            extract_close_series(&table, false),
            Err(ToolkitError::MissingCloseColumn)
        ));
    }

    #[test]
    fn raises_if_no_close_cols() {
        let table = make_table(&[("Open", &[9.0, 9.5, 10.0])]);
        assert!(matches!(
            extract_close_series(&table, true),
            Err(ToolkitError::MissingCloseColumn)
        ));
    }

    #[test]
    fn rejects_empty_table() {
        let table = PriceTable::new(Vec::new());
        assert!(matches!(
            extract_close_series(&table, true),
            Err(ToolkitError::EmptyData)
        ));
    }
}
