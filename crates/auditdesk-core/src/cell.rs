//! Dynamically typed spreadsheet cells.
//!
//! Imported rows keep whatever columns the uploaded sheet had. A row is an
//! ordered mapping from header to [`CellValue`]; cells that were blank in the
//! sheet are absent from the mapping rather than stored as `Empty`.
//!
//! Serialized as plain JSON scalars (`"text"`, `3.5`, `true`, `null`) so a
//! stored row reads exactly like the sheet it came from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell value as read from the sheet. No coercion happens at import;
/// [`CellValue::display_text`] converts to text when a row is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Render the value as display text.
    ///
    /// Integral numbers print without a fractional part (`3`, not `3.0`).
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// One imported row: header name to cell value, in sheet column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRecord(IndexMap<String, CellValue>);

impl RowRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell. Empty cells are dropped so the key stays missing.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        if !value.is_empty() {
            self.0.insert(column.into(), value);
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0.get(column)
    }

    /// Display text for a column, `""` when the column is missing.
    #[must_use]
    pub fn display(&self, column: &str) -> String {
        self.get(column).map(CellValue::display_text).unwrap_or_default()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
