use chrono::{NaiveDate, NaiveDateTime};

use super::error::AnimalError;
use super::types::CellValue;

/// Text formats recognised as dates in stored cells.
pub const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Format used when a date is written back.
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses text in any of [`DATE_FORMATS`], keeping only the date part.
pub fn parse_date_like(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS.iter().find_map(|format| {
        if format.contains("%H") {
            NaiveDateTime::parse_from_str(text, format)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(text, format).ok()
        }
    })
}

/// The editor input chosen for a stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum EditInput {
    Date(NaiveDate),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl EditInput {
    pub fn for_value(value: &CellValue) -> Self {
        match value {
            CellValue::Integer(n) => EditInput::Integer(*n),
            CellValue::Real(f) => EditInput::Real(*f),
            CellValue::Text(s) => match parse_date_like(s) {
                Some(date) => EditInput::Date(date),
                None => EditInput::Text(s.clone()),
            },
            CellValue::Null => EditInput::Text(String::new()),
        }
    }

    /// The HTML `type` attribute for this input.
    pub fn html_type(&self) -> &'static str {
        match self {
            EditInput::Date(_) => "date",
            EditInput::Integer(_) | EditInput::Real(_) => "number",
            EditInput::Text(_) => "text",
        }
    }

    /// The HTML `step` attribute, for numeric inputs.
    pub fn step(&self) -> &'static str {
        match self {
            EditInput::Integer(_) => "1",
            EditInput::Real(_) => "any",
            _ => "",
        }
    }

    /// The value pre-filled in the form.
    pub fn initial(&self) -> String {
        match self {
            EditInput::Date(date) => date.format(STORED_DATE_FORMAT).to_string(),
            EditInput::Integer(n) => n.to_string(),
            EditInput::Real(f) => f.to_string(),
            EditInput::Text(s) => s.clone(),
        }
    }
}

/// Converts a submitted form value back to a cell, guided by the stored value.
///
/// Dates are written as `YYYY-MM-DD`. An empty submission clears numeric and
/// date cells, and keeps a NULL text cell NULL.
pub fn coerce_submitted(
    column: &str,
    original: &CellValue,
    raw: &str,
) -> Result<CellValue, AnimalError> {
    let trimmed = raw.trim();
    match EditInput::for_value(original) {
        EditInput::Date(_) => {
            if trimmed.is_empty() {
                return Ok(CellValue::Null);
            }
            parse_date_like(trimmed)
                .map(|date| CellValue::Text(date.format(STORED_DATE_FORMAT).to_string()))
                .ok_or_else(|| AnimalError::InvalidDate {
                    column: column.to_string(),
                    value: raw.to_string(),
                })
        }
        EditInput::Integer(_) => {
            if trimmed.is_empty() {
                return Ok(CellValue::Null);
            }
            trimmed
                .parse::<i64>()
                .map(CellValue::Integer)
                .map_err(|_| AnimalError::InvalidInteger {
                    column: column.to_string(),
                    value: raw.to_string(),
                })
        }
        EditInput::Real(_) => {
            if trimmed.is_empty() {
                return Ok(CellValue::Null);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(CellValue::Real(f)),
                _ => Err(AnimalError::InvalidNumber {
                    column: column.to_string(),
                    value: raw.to_string(),
                }),
            }
        }
        EditInput::Text(_) => {
            if original == &CellValue::Null && raw.is_empty() {
                Ok(CellValue::Null)
            } else {
                Ok(CellValue::Text(raw.to_string()))
            }
        }
    }
}
