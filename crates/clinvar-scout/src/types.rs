//! Core data types: extraction strategies, raw records, and normalized records.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder used whenever a normalized field cannot be determined.
pub const NO_DATA: &str = "No data available";

/// Which acquisition path to use for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// JavaScript-capable headless browser.
    Heavy,
    /// Single HTTP GET plus static HTML parsing.
    Light,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Heavy => f.write_str("heavy"),
            Strategy::Light => f.write_str("light"),
        }
    }
}

/// One table row: ordered column name to cell text.
///
/// Keys come straight from page markup (headers, `column_N`, or fixed
/// names such as `Gene`), so lookups go through [`Row::get`] or
/// [`Row::find`] and never assume a key exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell; a repeated key replaces the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((key, value)),
        }
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value whose key satisfies `pred`.
    pub fn find(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.cells
            .iter()
            .filter(|(k, v)| pred(k) && !v.trim().is_empty())
            .map(|(_, v)| v.as_str())
            .next()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Headline fields of a variant page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<String>,
}

/// Loosely keyed extraction output, produced fresh for every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub summary: Summary,
    /// Key/value table rows; last write wins, never an empty key.
    pub identifiers: BTreeMap<String, String>,
    pub gene_info: Vec<Row>,
    pub molecular_consequences: Vec<Row>,
    pub submissions: Vec<Row>,
    pub conditions: Vec<Row>,
}

impl RawRecord {
    /// Record a key/value pair, ignoring empty keys or values.
    pub fn add_identifier(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if key.is_empty() || value.is_empty() {
            return;
        }
        self.identifiers.insert(key, value);
    }
}

/// Fixed-schema output returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub variant_type: String,
    pub condition: String,
    pub classification: String,
    pub gene_name: String,
    /// `• <nucleotide> – <consequence>` bullets, never empty.
    pub molecular_consequences: Vec<String>,
}
