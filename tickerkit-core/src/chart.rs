//! Chart payloads handed to an external renderer.
//!
//! The core only assembles validated lines; drawing is left to whatever
//! implements [`ChartRenderer`]. [`JsonChartWriter`] serializes the payload.

use crate::domain::{PriceSeries, Window};
use crate::error::Result;
use crate::indicators::moving_average;
use crate::validation::validate_price_series;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLine {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl ChartLine {
    fn from_series(name: impl Into<String>, series: &PriceSeries) -> Self {
        Self {
            name: name.into(),
            points: series
                .iter()
                .map(|(timestamp, value)| ChartPoint {
                    timestamp: *timestamp,
                    value: *value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Price,
    Returns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: Option<String>,
    pub kind: ChartKind,
    pub lines: Vec<ChartLine>,
}

/// Price line plus one `MA {w}` overlay per window, in the order given.
pub fn price_chart(series: &PriceSeries, ma_windows: &[Window], title: Option<&str>) -> Result<ChartSpec> {
    validate_price_series(series)?;
    let mut lines = vec![ChartLine::from_series(series.name().unwrap_or("Price"), series)];
    for &window in ma_windows {
        let ma = moving_average(series, window)?;
        lines.push(ChartLine::from_series(format!("MA {window}"), &ma));
    }
    Ok(ChartSpec {
        title: title.map(str::to_string),
        kind: ChartKind::Price,
        lines,
    })
}

pub fn returns_chart(series: &PriceSeries, title: Option<&str>) -> Result<ChartSpec> {
    validate_price_series(series)?;
    Ok(ChartSpec {
        title: title.map(str::to_string),
        kind: ChartKind::Returns,
        lines: vec![ChartLine::from_series(series.name().unwrap_or("Returns"), series)],
    })
}

/// Something that can present a chart.
pub trait ChartRenderer {
    fn render(&mut self, chart: &ChartSpec) -> Result<()>;
}

/// Writes charts as pretty-printed JSON.
pub struct JsonChartWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonChartWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartRenderer for JsonChartWriter<W> {
    fn render(&mut self, chart: &ChartSpec) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, chart)?;
        writeln!(self.out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::make_series;
    use crate::error::ToolkitError;
    use crate::indicators::{compute_returns, ReturnMethod};

    fn window(n: i64) -> Window {
        Window::new(n).unwrap()
    }

    #[test]
    fn price_chart_adds_overlays_in_order() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0]).with_name("Close");
        let chart = price_chart(&series, &[window(2), window(3)], Some("SPY")).unwrap();
        let names: Vec<_> = chart.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "MA 2", "MA 3"]);
        assert_eq!(chart.title.as_deref(), Some("SPY"));
        assert_eq!(chart.kind, ChartKind::Price);
        assert_eq!(chart.lines[1].points[0].value, None);
        assert_eq!(chart.lines[1].points[1].value, Some(1.5));
        assert!(chart.lines.iter().all(|l| l.points.len() == 4));
    }

    #[test]
    fn unnamed_series_uses_default_labels() {
        let series = make_series(&[1.0, 2.0]);
        assert_eq!(price_chart(&series, &[], None).unwrap().lines[0].name, "Price");
        assert_eq!(returns_chart(&series, None).unwrap().lines[0].name, "Returns");
    }

    #[test]
    fn returns_chart_keeps_series_name() {
        let returns = compute_returns(
            &make_series(&[100.0, 110.0, 99.0]).with_name("Close"),
            ReturnMethod::Simple,
        )
        .unwrap();
        let chart = returns_chart(&returns, None).unwrap();
        assert_eq!(chart.kind, ChartKind::Returns);
        assert_eq!(chart.lines[0].name, "Close");
        assert_eq!(chart.lines[0].points.len(), 2);
    }

    #[test]
    fn charts_validate_input() {
        let empty = make_series(&[]);
        assert!(matches!(price_chart(&empty, &[], None), Err(ToolkitError::EmptyData)));
        let missing = make_series(&[f64::NAN, f64::NAN]);
        assert!(matches!(returns_chart(&missing, None), Err(ToolkitError::AllMissing)));
    }

    #[test]
    fn json_writer_emits_nulls_for_missing() {
        let series = make_series(&[1.0, 2.0, 3.0]);
        let chart = price_chart(&series, &[window(2)], Some("t")).unwrap();
        let mut writer = JsonChartWriter::new(Vec::new());
        writer.render(&chart).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        assert_eq!(json["kind"], "price");
        assert_eq!(json["lines"][1]["name"], "MA 2");
        assert!(json["lines"][1]["points"][0]["value"].is_null());
        assert_eq!(json["lines"][1]["points"][2]["value"], 2.5);
    }
}
