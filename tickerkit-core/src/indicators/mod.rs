//! Series transforms: returns and trailing-window indicators.
//!
//! Every transform validates its input, never mutates it, and returns a
//! freshly allocated series. Rolling indicators keep the input's length and
//! index; positions without a full window of observations are missing.

pub mod moving_average;
pub mod returns;
pub mod volatility;

pub use moving_average::moving_average;
pub use returns::{compute_returns, ReturnMethod};
pub use volatility::rolling_volatility;

use crate::domain::{PriceSeries, Window};

/// Apply `stat` to each full trailing window of `series`.
///
/// A position yields `None` if fewer than `window` observations end there or
/// if any observation in its window is missing. The statistic itself may also
/// decline to produce a value.
pub(crate) fn rolling_apply(
    series: &PriceSeries,
    window: Window,
    stat: impl Fn(&[f64]) -> Option<f64>,
) -> PriceSeries {
    let w = window.get();
    let values = series.values();
    let mut buf = Vec::with_capacity(w);

    let out = (0..values.len())
        .map(|i| {
            if i + 1 < w {
                return None;
            }
            buf.clear();
            for v in &values[(i + 1 - w)..=i] {
                buf.push((*v)?);
            }
            stat(buf.as_slice())
        })
        .collect();

    series.with_values(out)
}
