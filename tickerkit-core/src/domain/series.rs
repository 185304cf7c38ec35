//! TimeSeries: ordered `(timestamp, value)` pairs over a timestamp axis.

use crate::error::{Result, ToolkitError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A time-indexed sequence of values with an optional name.
///
/// Index and values are stored as parallel vectors of equal length. The index
/// is expected to be non-decreasing; duplicates are kept as they are. The
/// ordering is checked by the validation gate, not on construction, so that a
/// malformed series can still be represented and rejected with a typed error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "SeriesParts<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct TimeSeries<T> {
    name: Option<String>,
    index: Vec<NaiveDateTime>,
    values: Vec<T>,
}

/// Unchecked serialized form; goes through [`TimeSeries::new`].
#[derive(Deserialize)]
struct SeriesParts<T> {
    #[serde(default)]
    name: Option<String>,
    index: Vec<NaiveDateTime>,
    values: Vec<T>,
}

impl<T> TryFrom<SeriesParts<T>> for TimeSeries<T> {
    type Error = ToolkitError;

    fn try_from(parts: SeriesParts<T>) -> Result<Self> {
        let mut series = Self::new(parts.index, parts.values)?;
        series.name = parts.name;
        Ok(series)
    }
}

/// Numeric series where `None` marks a missing observation.
///
/// A NaN produced by arithmetic stays `Some(NaN)`: it is a computed value,
/// not an absent one.
pub type PriceSeries = TimeSeries<Option<f64>>;

impl<T> TimeSeries<T> {
    /// Build a series from parallel index and value vectors.
    pub fn new(index: Vec<NaiveDateTime>, values: Vec<T>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ToolkitError::LengthMismatch {
                index: index.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            name: None,
            index,
            values,
        })
    }

    /// Build a series from `(timestamp, value)` pairs.
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDateTime, T)>) -> Self {
        let (index, values) = points.into_iter().unzip();
        Self {
            name: None,
            index,
            values,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDateTime, &T)> {
        self.index.iter().zip(self.values.iter())
    }

    /// True if every timestamp is `>=` its predecessor.
    pub fn is_index_monotonic(&self) -> bool {
        is_non_decreasing(&self.index)
    }

    /// Replace the values while keeping index and name.
    pub(crate) fn with_values<U>(&self, values: Vec<U>) -> TimeSeries<U> {
        debug_assert_eq!(values.len(), self.index.len());
        TimeSeries {
            name: self.name.clone(),
            index: self.index.clone(),
            values,
        }
    }

    pub fn into_parts(self) -> (Option<String>, Vec<NaiveDateTime>, Vec<T>) {
        (self.name, self.index, self.values)
    }
}

impl PriceSeries {
    /// Build a series from raw floats, treating NaN as a missing observation.
    pub fn from_f64(index: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        let values = values
            .into_iter()
            .map(|v| if v.is_nan() { None } else { Some(v) })
            .collect();
        Self::new(index, values)
    }

    /// Number of non-missing observations.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Copy of the series without the missing observations.
    pub fn drop_missing(&self) -> PriceSeries {
        let mut out = TimeSeries::from_points(
            self.iter()
                .filter(|(_, v)| v.is_some())
                .map(|(ts, v)| (*ts, *v)),
        );
        out.name = self.name.clone();
        out
    }
}

pub(crate) fn is_non_decreasing(index: &[NaiveDateTime]) -> bool {
    index.windows(2).all(|w| w[0] <= w[1])
}
