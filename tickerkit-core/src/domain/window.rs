//! Validated rolling-window length, counted in points.

use crate::error::ToolkitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Positive number of points in a trailing window.
///
/// Integrality is a type contract: `2.0` is rejected like `2.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "i64")]
pub struct Window(usize);

impl Window {
    pub fn new(size: i64) -> Result<Self, ToolkitError> {
        if size <= 0 {
            return Err(ToolkitError::NonPositiveWindow(size));
        }
        usize::try_from(size)
            .map(Self)
            .map_err(|_| ToolkitError::WrongType(format!("window {size} does not fit in usize")))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Window {
    type Error = ToolkitError;

    fn try_from(size: i64) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl TryFrom<serde_json::Value> for Window {
    type Error = ToolkitError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        crate::validation::validate_window(&value)
    }
}

impl From<Window> for i64 {
    fn from(window: Window) -> Self {
        window.0 as i64
    }
}

impl FromStr for Window {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(size) = s.parse::<i64>() {
            return Self::new(size);
        }
        if s.parse::<f64>().is_ok() {
            return Err(ToolkitError::WrongType(format!(
                "window must be an integer, got float {s}"
            )));
        }
        Err(ToolkitError::WrongType(format!(
            "window must be an integer, got {s:?}"
        )))
    }
}
