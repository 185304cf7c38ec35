//! Calendar resampling of price tables.
//!
//! Rows are grouped into calendar buckets (day, week, month, quarter, year)
//! and every column is reduced independently. Missing values are skipped by
//! the reduction; a bucket with nothing to reduce is missing. Buckets between
//! the first and last populated one are always emitted, so the output index is
//! a regular calendar sequence.

use crate::domain::PriceTable;
use crate::error::{Result, ToolkitError};
use crate::validation::validate_price_table;
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the values of one bucket collapse into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Aggregation {
    #[default]
    Last,
    First,
    Mean,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Last => "last",
            Aggregation::First => "first",
            Aggregation::Mean => "mean",
        }
    }

    /// Trim and lowercase before parsing, for user-facing input.
    pub fn parse_loose(s: &str) -> Result<Self> {
        s.trim().to_lowercase().parse()
    }

    fn reduce(self, values: &[Option<f64>]) -> Option<f64> {
        match self {
            Aggregation::Last => values.iter().rev().find_map(|v| *v),
            Aggregation::First => values.iter().find_map(|v| *v),
            Aggregation::Mean => {
                let (sum, count) = values
                    .iter()
                    .flatten()
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                (count > 0).then(|| sum / count as f64)
            }
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match on `"last"`, `"first"` or `"mean"`.
impl FromStr for Aggregation {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last" => Ok(Aggregation::Last),
            "first" => Ok(Aggregation::First),
            "mean" => Ok(Aggregation::Mean),
            other => Err(ToolkitError::UnsupportedAggregation(other.to_string())),
        }
    }
}

impl TryFrom<String> for Aggregation {
    type Error = ToolkitError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse_loose(&s)
    }
}

impl From<Aggregation> for String {
    fn from(aggregation: Aggregation) -> Self {
        aggregation.as_str().to_string()
    }
}

/// Calendar bucket size. Buckets are labelled by the date they end on, except
/// `MonthStart` which is labelled by the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Day,
    /// Week ending on the anchor day (`W` is `W-SUN`).
    Week(Weekday),
    MonthEnd,
    MonthStart,
    QuarterEnd,
    YearEnd,
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Week(Weekday::Sun)
    }
}

impl Frequency {
    /// Label of the bucket containing `date`.
    pub fn label(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Day => Some(date),
            Frequency::Week(anchor) => {
                let ahead = (anchor.num_days_from_monday() + 7
                    - date.weekday().num_days_from_monday())
                    % 7;
                date.checked_add_days(Days::new(u64::from(ahead)))
            }
            Frequency::MonthEnd => month_end(date.year(), date.month()),
            Frequency::MonthStart => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Frequency::QuarterEnd => month_end(date.year(), (date.month() - 1) / 3 * 3 + 3),
            Frequency::YearEnd => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        }
    }

    /// Label of the bucket after the one labelled `label`.
    pub fn next_label(self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::MonthStart => {
                let end = month_end(label.year(), label.month())?;
                end.succ_opt()
            }
            _ => self.label(label.succ_opt()?),
        }
    }

    pub fn code(self) -> String {
        match self {
            Frequency::Day => "D".into(),
            Frequency::Week(Weekday::Sun) => "W".into(),
            Frequency::Week(anchor) => format!("W-{}", weekday_code(anchor)),
            Frequency::MonthEnd => "M".into(),
            Frequency::MonthStart => "MS".into(),
            Frequency::QuarterEnd => "Q".into(),
            Frequency::YearEnd => "Y".into(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// Parses frequency codes case-insensitively: `D`, `W`, `W-MON`..`W-SUN`,
/// `M`/`ME`, `MS`, `Q`/`QE`, `Y`/`YE`/`A`.
impl FromStr for Frequency {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        let freq = match code.as_str() {
            "D" => Frequency::Day,
            "W" => Frequency::Week(Weekday::Sun),
            "M" | "ME" => Frequency::MonthEnd,
            "MS" => Frequency::MonthStart,
            "Q" | "QE" => Frequency::QuarterEnd,
            "Y" | "YE" | "A" => Frequency::YearEnd,
            other => match other.strip_prefix("W-").and_then(parse_weekday) {
                Some(anchor) => Frequency::Week(anchor),
                None => return Err(ToolkitError::UnsupportedFrequency(s.to_string())),
            },
        };
        Ok(freq)
    }
}

impl TryFrom<String> for Frequency {
    type Error = ToolkitError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.code()
    }
}

/// Resample a table into calendar buckets, reducing each column with `aggregation`.
pub fn resample(
    table: &PriceTable,
    frequency: Frequency,
    aggregation: Aggregation,
) -> Result<PriceTable> {
    validate_price_table(table, None)?;

    let out_of_range = || ToolkitError::InvalidIndex("timestamp outside the calendar range".into());

    // The index is sorted, so the labels are too.
    let labels = table
        .index()
        .iter()
        .map(|ts| frequency.label(ts.date()).ok_or_else(out_of_range))
        .collect::<Result<Vec<_>>>()?;

    let last = labels[labels.len() - 1];
    let mut buckets = vec![labels[0]];
    while buckets[buckets.len() - 1] < last {
        let next = frequency
            .next_label(buckets[buckets.len() - 1])
            .ok_or_else(out_of_range)?;
        buckets.push(next);
    }

    let mut reduced: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(buckets.len()); table.width()];
    let mut row = 0;
    for bucket in &buckets {
        let start = row;
        while row < labels.len() && labels[row] == *bucket {
            row += 1;
        }
        for (out, column) in reduced.iter_mut().zip(table.columns()) {
            out.push(aggregation.reduce(&column.values[start..row]));
        }
    }

    tracing::debug!(
        rows = table.height(),
        buckets = buckets.len(),
        frequency = %frequency,
        aggregation = %aggregation,
        "resampled table"
    );

    let index = buckets
        .into_iter()
        .map(|d| d.and_time(NaiveTime::MIN))
        .collect();
    let mut out = PriceTable::new(index);
    for (column, values) in table.columns().iter().zip(reduced) {
        out.insert_column(column.name.clone(), values)?;
    }
    Ok(out)
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn parse_weekday(code: &str) -> Option<Weekday> {
    match code {
        "MON" => Some(Weekday::Mon),
        "TUE" => Some(Weekday::Tue),
        "WED" => Some(Weekday::Wed),
        "THU" => Some(Weekday::Thu),
        "FRI" => Some(Weekday::Fri),
        "SAT" => Some(Weekday::Sat),
        "SUN" => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{assert_approx, make_table, ts, DEFAULT_EPSILON};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn five_days() -> PriceTable {
        // 2024-01-01 is a Monday
        make_table(&[("Close", &[1.0, 2.0, 3.0, 4.0, 5.0])])
    }

    #[test]
    fn weekly_last_first_mean() {
        let table = five_days();
        let last = resample(&table, Frequency::Week(Weekday::Sun), Aggregation::Last).unwrap();
        assert_eq!(last.index(), &[ts(2024, 1, 7)]);
        assert_eq!(last.column("Close"), Some(&[Some(5.0)][..]));

        let first = resample(&table, Frequency::Week(Weekday::Sun), Aggregation::First).unwrap();
        assert_eq!(first.column("Close"), Some(&[Some(1.0)][..]));

        let mean = resample(&table, Frequency::Week(Weekday::Sun), Aggregation::Mean).unwrap();
        assert_approx(mean.column("Close").unwrap()[0].unwrap(), 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn aggregation_parsing() {
        assert_eq!("last".parse::<Aggregation>().unwrap(), Aggregation::Last);
        assert!(matches!(
            "median".parse::<Aggregation>(),
            Err(ToolkitError::UnsupportedAggregation(_))
        ));
        assert!(matches!(
            "FIRST".parse::<Aggregation>(),
            Err(ToolkitError::UnsupportedAggregation(_))
        ));
        assert_eq!(Aggregation::parse_loose(" FIRST ").unwrap(), Aggregation::First);
        assert!(Aggregation::parse_loose("median").is_err());
    }

    #[test]
    fn frequency_parsing() {
        assert_eq!("W".parse::<Frequency>().unwrap(), Frequency::Week(Weekday::Sun));
        assert_eq!("w-fri".parse::<Frequency>().unwrap(), Frequency::Week(Weekday::Fri));
        assert_eq!("M".parse::<Frequency>().unwrap(), Frequency::MonthEnd);
        assert_eq!("ME".parse::<Frequency>().unwrap(), Frequency::MonthEnd);
        assert_eq!("MS".parse::<Frequency>().unwrap(), Frequency::MonthStart);
        assert_eq!("q".parse::<Frequency>().unwrap(), Frequency::QuarterEnd);
        assert_eq!("A".parse::<Frequency>().unwrap(), Frequency::YearEnd);
        assert!(matches!(
            "fortnight".parse::<Frequency>(),
            Err(ToolkitError::UnsupportedFrequency(_))
        ));
        assert!("W-XYZ".parse::<Frequency>().is_err());
    }

    #[test]
    fn frequency_code_roundtrips() {
        for code in ["D", "W", "W-FRI", "M", "MS", "Q", "Y"] {
            assert_eq!(code.parse::<Frequency>().unwrap().code(), code);
        }
    }

    #[test]
    fn labels() {
        let wed = date(2024, 1, 3);
        assert_eq!(Frequency::Week(Weekday::Sun).label(wed), Some(date(2024, 1, 7)));
        assert_eq!(Frequency::Week(Weekday::Wed).label(wed), Some(wed));
        assert_eq!(Frequency::MonthEnd.label(date(2024, 2, 10)), Some(date(2024, 2, 29)));
        assert_eq!(Frequency::MonthStart.label(date(2024, 2, 10)), Some(date(2024, 2, 1)));
        assert_eq!(Frequency::QuarterEnd.label(date(2024, 5, 1)), Some(date(2024, 6, 30)));
        assert_eq!(Frequency::QuarterEnd.label(date(2024, 12, 1)), Some(date(2024, 12, 31)));
        assert_eq!(Frequency::YearEnd.label(date(2024, 5, 1)), Some(date(2024, 12, 31)));
    }

    #[test]
    fn next_labels() {
        assert_eq!(Frequency::MonthEnd.next_label(date(2024, 1, 31)), Some(date(2024, 2, 29)));
        assert_eq!(Frequency::MonthStart.next_label(date(2024, 12, 1)), Some(date(2025, 1, 1)));
        assert_eq!(Frequency::QuarterEnd.next_label(date(2024, 3, 31)), Some(date(2024, 6, 30)));
        assert_eq!(
            Frequency::Week(Weekday::Sun).next_label(date(2024, 1, 7)),
            Some(date(2024, 1, 14))
        );
    }

    #[test]
    fn empty_buckets_are_missing_rows() {
        let table = PriceTable::new(vec![ts(2024, 1, 15), ts(2024, 3, 5)])
            .with_column("Close", vec![Some(1.0), Some(3.0)])
            .unwrap();
        let monthly = resample(&table, Frequency::MonthEnd, Aggregation::Last).unwrap();
        assert_eq!(
            monthly.index(),
            &[ts(2024, 1, 31), ts(2024, 2, 29), ts(2024, 3, 31)]
        );
        assert_eq!(monthly.column("Close"), Some(&[Some(1.0), None, Some(3.0)][..]));
    }

    #[test]
    fn reductions_skip_missing_values() {
        let table = PriceTable::new(vec![ts(2024, 1, 1), ts(2024, 1, 2), ts(2024, 1, 3)])
            .with_column("Close", vec![None, Some(2.0), None])
            .unwrap();
        for how in [Aggregation::Last, Aggregation::First, Aggregation::Mean] {
            let out = resample(&table, Frequency::Week(Weekday::Sun), how).unwrap();
            assert_eq!(out.column("Close"), Some(&[Some(2.0)][..]), "{how}");
        }
    }

    #[test]
    fn every_column_is_reduced() {
        let table = make_table(&[
            ("Open", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
            ("Volume", &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0]),
        ]);
        let weekly = resample(&table, Frequency::Week(Weekday::Sun), Aggregation::First).unwrap();
        assert_eq!(weekly.index(), &[ts(2024, 1, 7), ts(2024, 1, 14)]);
        assert_eq!(weekly.column("Open"), Some(&[Some(1.0), Some(8.0)][..]));
        assert_eq!(weekly.column("Volume"), Some(&[Some(10.0), Some(20.0)][..]));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            resample(&PriceTable::new(Vec::new()), Frequency::MonthEnd, Aggregation::Mean),
            Err(ToolkitError::EmptyData)
        ));
    }
}
