use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single fetched record: column name to raw value.
///
/// Values arrive as whatever the backend stored (numbers, numeric strings,
/// free text or null). Numeric accessors never fail; see [`parse_number`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by fixtures and the in-memory reader.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Value>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value of `column`, `0.0` when absent or non-numeric.
    pub fn number(&self, column: &str) -> f64 {
        parse_number(self.get(column))
    }

    /// Like [`Row::number`] but negative values are clamped to zero.
    pub fn non_negative(&self, column: &str) -> f64 {
        parse_non_negative(self.get(column))
    }

    pub fn optional_number(&self, column: &str) -> Option<f64> {
        parse_optional_number(self.get(column))
    }

    /// Connection-point count; fractional values truncate.
    pub fn count(&self, column: &str) -> u32 {
        parse_count(self.get(column))
    }

    /// Trimmed, non-empty text. Numbers are not stringified.
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// True when the column holds anything other than null or blank text.
    pub fn is_present(&self, column: &str) -> bool {
        match self.get(column) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Keep only `columns`; an empty slice keeps everything.
    pub fn project(&self, columns: &[&str]) -> Row {
        if columns.is_empty() {
            return self.clone();
        }
        let map = self
            .0
            .iter()
            .filter(|(k, _)| columns.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Row(map)
    }

    /// Copy of the row with column names trimmed and lowercased.
    pub fn normalized(&self) -> Row {
        let map = self
            .0
            .iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.clone()))
            .collect();
        Row(map)
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Row(map)
    }
}

/// Parse a raw field as a finite number.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace ignored).
/// Anything else, including NaN and infinities, yields `None`.
pub fn parse_optional_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }?;
    n.is_finite().then_some(n)
}

/// Absent, null and non-numeric values count as `0.0`. The sign is kept.
pub fn parse_number(value: Option<&Value>) -> f64 {
    parse_optional_number(value).unwrap_or(0.0)
}

/// Usage figures cannot be negative; a negative reading is treated as zero.
pub fn parse_non_negative(value: Option<&Value>) -> f64 {
    parse_number(value).max(0.0)
}

pub fn parse_count(value: Option<&Value>) -> u32 {
    let n = parse_non_negative(value).trunc();
    if n >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        n as u32
    }
}
