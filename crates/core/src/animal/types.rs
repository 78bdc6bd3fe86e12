use std::fmt;

use serde::{Deserialize, Serialize};

/// A single SQLite cell as stored in the `animais` table.
///
/// The table's columns come verbatim from uploaded spreadsheets, so values keep
/// their storage class instead of being forced into a fixed schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Infers a typed value from spreadsheet text.
    ///
    /// Blank text becomes `Null`, integer text becomes `Integer`, decimal text
    /// becomes `Real` and anything else stays `Text`.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return CellValue::Integer(n);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Real(f),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Returns true for NULL and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Reads the cell as a whole number.
    ///
    /// Accepts integers, reals without a fractional part and integer text.
    pub fn as_whole_number(&self) -> Option<i64> {
        match self {
            CellValue::Integer(n) => Some(*n),
            CellValue::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads the cell as a float, parsing text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(n) => Some(*n as f64),
            CellValue::Real(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Null => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(n) => write!(f, "{n}"),
            CellValue::Real(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

/// One row of the `animais` table, addressed by its SQLite rowid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimalRecord {
    pub rowid: i64,
    /// Column name and value pairs, in table order.
    pub fields: Vec<(String, CellValue)>,
}

impl AnimalRecord {
    pub fn new(rowid: i64) -> Self {
        Self {
            rowid,
            fields: Vec::new(),
        }
    }

    /// Appends a column value (builder style, mostly for tests).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.push((column.into(), value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Display text of a column, empty when the column is missing or NULL.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(ToString::to_string).unwrap_or_default()
    }

    /// Display text of a column, where `rowid` resolves to the row id.
    pub fn display(&self, column: &str) -> String {
        if column == "rowid" {
            self.rowid.to_string()
        } else {
            self.text(column)
        }
    }
}
