//! Spreadsheet import: format detection, column validation and projection.

mod error;

pub use error::ImportError;

use serde::Serialize;

use crate::animal::{CellValue, REQUIRED_COLUMNS};

/// Upload formats accepted by the import page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Xlsx,
    Xls,
    Ods,
}

impl SourceFormat {
    /// Detects the format from the uploaded file's extension.
    pub fn from_file_name(name: &str) -> Result<Self, ImportError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "html" | "htm" => Ok(SourceFormat::Html),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            "ods" => Ok(SourceFormat::Ods),
            _ => Err(ImportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// A table as parsed from an upload: a header row and typed cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Data ready to replace the `animais` table, restricted to the required
/// columns in their canonical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ImportTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The first `limit` rows, for the preview page.
    pub fn preview(&self, limit: usize) -> &[Vec<CellValue>] {
        &self.rows[..self.rows.len().min(limit)]
    }
}

/// Required columns absent from `headers`, in canonical order.
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.trim() == **required))
        .map(|required| required.to_string())
        .collect()
}

/// Validates the header row and projects every row to the required columns.
///
/// Short rows are padded with NULL. Rows that are blank in every required
/// column are dropped.
pub fn project_required(raw: RawTable) -> Result<ImportTable, ImportError> {
    let missing = missing_columns(&raw.headers);
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let positions: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|required| raw.headers.iter().position(|h| h.trim() == *required))
        .collect();

    let rows = raw
        .rows
        .into_iter()
        .map(|row| {
            positions
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(|cell| !cell.is_blank()))
        .collect();

    Ok(ImportTable {
        columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}
