//! Ticker symbol sets and the inputs they can be normalized from.

use serde::Serialize;

/// Normalized tickers: trimmed, uppercased, non-blank, in input order.
///
/// Duplicates are kept. Only [`crate::validation::validate_symbols`] builds one,
/// so a `SymbolSet` always holds at least one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolSet(Vec<String>);

impl SymbolSet {
    pub(crate) fn from_normalized(symbols: Vec<String>) -> Self {
        debug_assert!(!symbols.is_empty());
        Self(symbols)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first symbol. Always present.
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PartialEq<Vec<&str>> for SymbolSet {
    fn eq(&self, other: &Vec<&str>) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b)
    }
}

/// Anything symbols can be collected from.
///
/// A bare string is one symbol, never a sequence of characters. Dynamic JSON
/// or TOML input keeps only its string elements.
pub trait SymbolSource {
    /// Raw candidate strings, before trimming and case folding.
    fn candidates(self) -> Vec<String>;
}

impl SymbolSource for &str {
    fn candidates(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl SymbolSource for String {
    fn candidates(self) -> Vec<String> {
        vec![self]
    }
}

impl SymbolSource for &String {
    fn candidates(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: AsRef<str>> SymbolSource for Vec<S> {
    fn candidates(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> SymbolSource for &[S] {
    fn candidates(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> SymbolSource for [S; N] {
    fn candidates(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl SymbolSource for &serde_json::Value {
    fn candidates(self) -> Vec<String> {
        match self {
            serde_json::Value::String(s) => vec![s.clone()],
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_string_is_one_candidate() {
        assert_eq!(" aapl ".candidates(), vec![" aapl ".to_string()]);
    }

    #[test]
    fn json_array_drops_non_strings() {
        let value = json!(["aapl", 3, null, "msft", ["nested"]]);
        assert_eq!(value.candidates(), vec!["aapl".to_string(), "msft".to_string()]);
    }

    #[test]
    fn json_scalar_non_string_has_no_candidates() {
        assert!(json!(42).candidates().is_empty());
    }
}
