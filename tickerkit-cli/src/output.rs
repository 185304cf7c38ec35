//! CSV output for tables and aligned series.
//!
//! Missing values are written as empty cells. Daily timestamps are written as
//! plain dates so the files can be read back by the CSV directory provider.

use anyhow::Result;
use chrono::{NaiveDateTime, NaiveTime};
use std::io::Write;
use tickerkit_core::data::CSV_INDEX_COLUMN;
use tickerkit_core::domain::{PriceSeries, PriceTable};

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write a table with a leading `Date` column.
pub fn write_table<W: Write>(out: W, table: &PriceTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec![CSV_INDEX_COLUMN];
    header.extend(table.column_names());
    writer.write_record(&header)?;

    for (row, ts) in table.index().iter().enumerate() {
        let mut record = vec![format_timestamp(ts)];
        record.extend(table.columns().iter().map(|c| format_value(c.values[row])));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write several series side by side.
///
/// When every index is a tail of the longest one (the case for close, returns
/// and rolling series derived from it), rows are aligned by position from the
/// end. Otherwise the series are merged in timestamp order, one point per
/// series per row. Either way a duplicate timestamp stays a separate row and a
/// series with no point at a row gets an empty cell.
pub fn write_aligned<W: Write>(out: W, series: &[(String, PriceSeries)]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec![CSV_INDEX_COLUMN];
    header.extend(series.iter().map(|(name, _)| name.as_str()));
    writer.write_record(&header)?;

    match tail_offsets(series) {
        Some((reference, offsets)) => {
            for (row, ts) in reference.iter().enumerate() {
                let mut record = vec![format_timestamp(ts)];
                for ((_, s), &offset) in series.iter().zip(&offsets) {
                    let cell = row.checked_sub(offset).map(|i| s.values()[i]);
                    record.push(cell.map(format_value).unwrap_or_default());
                }
                writer.write_record(&record)?;
            }
        }
        None => {
            let mut cursors = vec![0usize; series.len()];
            loop {
                let next = series
                    .iter()
                    .zip(&cursors)
                    .filter_map(|((_, s), &pos)| s.index().get(pos))
                    .min()
                    .copied();
                let Some(ts) = next else { break };

                let mut record = vec![format_timestamp(&ts)];
                for ((_, s), pos) in series.iter().zip(cursors.iter_mut()) {
                    if s.index().get(*pos) == Some(&ts) {
                        record.push(format_value(s.values()[*pos]));
                        *pos += 1;
                    } else {
                        record.push(String::new());
                    }
                }
                writer.write_record(&record)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Longest index and each series' row offset into it, if every index is a tail of it.
fn tail_offsets(series: &[(String, PriceSeries)]) -> Option<(&[NaiveDateTime], Vec<usize>)> {
    let reference = series.iter().map(|(_, s)| s.index()).max_by_key(|i| i.len())?;
    let offsets = series
        .iter()
        .map(|(_, s)| {
            let offset = reference.len() - s.len();
            (reference[offset..] == *s.index()).then_some(offset)
        })
        .collect::<Option<Vec<_>>>()?;
    Some((reference, offsets))
}
