//! PriceTable: named numeric columns over a shared timestamp axis.

use super::series::{is_non_decreasing, PriceSeries, TimeSeries};
use crate::error::{Result, ToolkitError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Canonical column names used by the providers.
pub mod columns {
    pub const OPEN: &str = "Open";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const ADJ_CLOSE: &str = "Adj Close";
    pub const VOLUME: &str = "Volume";
}

/// A single named column of a [`PriceTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Tabular price data as returned by a provider.
///
/// The column set is provider-dependent; column order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct PriceTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<TableColumn>,
}

/// Unchecked serialized form; columns go through [`PriceTable::insert_column`].
#[derive(Deserialize)]
struct TableParts {
    index: Vec<NaiveDateTime>,
    columns: Vec<TableColumn>,
}

impl TryFrom<TableParts> for PriceTable {
    type Error = ToolkitError;

    fn try_from(parts: TableParts) -> Result<Self> {
        let mut table = PriceTable::new(parts.index);
        for column in parts.columns {
            table.insert_column(column.name, column.values)?;
        }
        Ok(table)
    }
}

impl PriceTable {
    /// Empty table (no columns) over the given index.
    pub fn new(index: Vec<NaiveDateTime>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.index.len() {
            return Err(ToolkitError::LengthMismatch {
                index: self.index.len(),
                values: values.len(),
            });
        }
        let name = name.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(TableColumn { name, values }),
        }
        Ok(())
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// A column as a series over the table index, named after the column.
    pub fn column_series(&self, name: &str) -> Option<PriceSeries> {
        let values = self.column(name)?.to_vec();
        TimeSeries::new(self.index.clone(), values)
            .ok()
            .map(|s| s.with_name(name))
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.index.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True if the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn is_index_monotonic(&self) -> bool {
        is_non_decreasing(&self.index)
    }

    /// Keep only the rows whose timestamp satisfies `keep`.
    pub fn filter_rows(&self, keep: impl Fn(&NaiveDateTime) -> bool) -> PriceTable {
        let rows: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, ts)| keep(ts))
            .map(|(i, _)| i)
            .collect();
        PriceTable {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| TableColumn {
                    name: c.name.clone(),
                    values: rows.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }
}
