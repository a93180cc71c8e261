//! The untyped request parameter bag the engine starts from.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// A single raw parameter: either one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Many(_) => None,
        }
    }

    /// True when there is nothing but whitespace in the value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(value) => value.trim().is_empty(),
            Self::Many(values) => values.iter().all(|value| value.trim().is_empty()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_owned).collect())
    }
}

/// Flat key/value parameters as received at the HTTP boundary.
///
/// Unknown keys are kept; it is the extractor's job to ignore what no
/// declaration asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    entries: HashMap<String, ParamValue>,
}

impl RawParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string.
    ///
    /// Values are percent-decoded. Repeated keys and `key[]` style keys are
    /// folded into [`ParamValue::Many`]; a lone `key[]` still yields a list.
    ///
    /// ```
    /// use querykit::{ParamValue, RawParams};
    ///
    /// let params = RawParams::from_query("status[]=pending&status[]=completed&page=2");
    /// assert_eq!(params.text("page"), Some("2"));
    /// assert_eq!(
    ///     params.get("status"),
    ///     Some(&ParamValue::Many(vec!["pending".into(), "completed".into()]))
    /// );
    /// ```
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.strip_suffix("[]") {
                Some(base) => params.push(base.to_owned(), value.into_owned(), true),
                None => params.push(key.into_owned(), value.into_owned(), false),
            }
        }
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// A single, non-blank value with surrounding whitespace removed.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ParamValue::Single(value)) => {
                let value = value.trim();
                (!value.is_empty()).then_some(value)
            }
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, key: String, value: String, as_list: bool) {
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(if as_list {
                    ParamValue::Many(vec![value])
                } else {
                    ParamValue::Single(value)
                });
            }
            Entry::Occupied(mut slot) => {
                let merged = match slot.get_mut() {
                    ParamValue::Many(values) => {
                        values.push(value);
                        return;
                    }
                    ParamValue::Single(first) => {
                        ParamValue::Many(vec![std::mem::take(first), value])
                    }
                };
                slot.insert(merged);
            }
        }
    }
}

impl<K, V> FromIterator<(K, V)> for RawParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
