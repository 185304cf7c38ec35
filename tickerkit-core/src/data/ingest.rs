//! Frame ingestion: converts polars frames (and the CSV/Parquet files behind
//! them) into `PriceTable`s and back.
//!
//! The index column must be temporal or a string in one of the accepted date
//! formats. Numeric columns become price columns; anything else is skipped.

use crate::domain::{PriceSeries, PriceTable};
use crate::error::{Result, ToolkitError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;

const STRING_INDEX_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl PriceTable {
    /// Build a table from a frame, using `index_column` as the timestamp index.
    pub fn from_frame(df: &DataFrame, index_column: &str) -> Result<Self> {
        let index = index_from_column(df, index_column)?;
        let mut table = PriceTable::new(index);
        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == index_column {
                continue;
            }
            if !is_numeric(column.dtype()) {
                tracing::debug!(column = name, dtype = %column.dtype(), "skipping non-numeric column");
                continue;
            }
            table.insert_column(name, numeric_values(column)?)?;
        }
        Ok(table)
    }

    /// Convert to a frame whose first column is `index_column` (millisecond datetimes).
    pub fn to_frame(&self, index_column: &str) -> Result<DataFrame> {
        let millis: Vec<i64> = self
            .index()
            .iter()
            .map(|ts| ts.and_utc().timestamp_millis())
            .collect();
        let index = Column::new(index_column.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let mut columns = Vec::with_capacity(self.width() + 1);
        columns.push(index);
        for column in self.columns() {
            columns.push(Column::new(column.name.as_str().into(), column.values.clone()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Extract one numeric column of a frame as a series named after it.
pub fn series_from_frame(df: &DataFrame, index_column: &str, value_column: &str) -> Result<PriceSeries> {
    let index = index_from_column(df, index_column)?;
    let column = df
        .column(value_column)
        .map_err(|_| ToolkitError::WrongType(format!("frame has no column {value_column:?}")))?;
    if !is_numeric(column.dtype()) {
        return Err(ToolkitError::WrongType(format!(
            "column {value_column:?} has non-numeric type {}",
            column.dtype()
        )));
    }
    Ok(PriceSeries::new(index, numeric_values(column)?)?.with_name(value_column))
}

/// Read a CSV file with a header row.
pub fn read_csv_table(path: &Path, index_column: &str) -> Result<PriceTable> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .collect()?;
    tracing::debug!(path = %path.display(), rows = df.height(), "read csv");
    PriceTable::from_frame(&df, index_column)
}

pub fn read_parquet_table(path: &Path, index_column: &str) -> Result<PriceTable> {
    let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;
    tracing::debug!(path = %path.display(), rows = df.height(), "read parquet");
    PriceTable::from_frame(&df, index_column)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Null and NaN both become missing.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn index_from_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDateTime>> {
    let column = df
        .column(name)
        .map_err(|_| ToolkitError::InvalidIndex(format!("frame has no index column {name:?}")))?;

    match column.dtype() {
        DataType::Datetime(..) | DataType::Date => {
            let millis = column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis
                .as_materialized_series()
                .i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(DateTime::from_timestamp_millis)
                        .map(|dt| dt.naive_utc())
                        .ok_or_else(|| {
                            ToolkitError::InvalidIndex(format!("index column {name:?} has missing timestamps"))
                        })
                })
                .collect()
        }
        DataType::String => column
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| {
                v.and_then(parse_index_string).ok_or_else(|| {
                    ToolkitError::InvalidIndex(format!(
                        "index column {name:?} has unparseable value {:?}",
                        v.unwrap_or("<null>")
                    ))
                })
            })
            .collect(),
        other => Err(ToolkitError::InvalidIndex(format!(
            "index column {name:?} is {other}, expected a date or datetime"
        ))),
    }
}

fn parse_index_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN));
    }
    STRING_INDEX_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
