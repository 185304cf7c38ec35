//! Offline provider backed by a directory of `{SYMBOL}.csv` files.

use super::ingest::read_csv_table;
use super::provider::{PriceProvider, ProviderError};
use crate::domain::PriceTable;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Name of the index column every CSV file must carry.
pub const CSV_INDEX_COLUMN: &str = "Date";

/// Reads `{dir}/{SYMBOL}.csv` and keeps rows with `start <= date < end`.
///
/// The interval is ignored; files hold whatever granularity they were written at.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{symbol}.csv`; a symbol that could name a path outside `dir` is rejected.
    fn symbol_path(&self, symbol: &str) -> Result<PathBuf, ProviderError> {
        if symbol.is_empty() || symbol.contains(['/', '\\']) || symbol.contains("..") {
            return Err(ProviderError::Other(format!(
                "symbol {symbol:?} is not usable as a file name"
            )));
        }
        Ok(self.dir.join(format!("{symbol}.csv")))
    }
}

impl PriceProvider for CsvDirectoryProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: &str,
    ) -> Result<Option<PriceTable>, ProviderError> {
        let path = self.symbol_path(symbol)?;
        if !path.is_file() {
            tracing::debug!(symbol, path = %path.display(), "no csv file for symbol");
            return Ok(None);
        }

        let table = read_csv_table(&path, CSV_INDEX_COLUMN).map_err(|e| ProviderError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let filtered = table.filter_rows(|ts| {
            let date = ts.date();
            date >= start && date < end
        });

        if filtered.height() == 0 {
            return Ok(None);
        }
        Ok(Some(filtered))
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
