//! Upload parsing: turns an uploaded file into a [`RawTable`].
//!
//! Validation and projection to the required columns happen in
//! `lotes_core::import`.

mod html;
mod spreadsheet;

use lotes_core::import::{project_required, ImportError, ImportTable, RawTable, SourceFormat};

pub use html::parse_html_table;
pub use spreadsheet::parse_first_sheet;

/// Parses an upload according to its file extension.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> Result<RawTable, ImportError> {
    match SourceFormat::from_file_name(file_name)? {
        SourceFormat::Html => parse_html_table(bytes),
        SourceFormat::Xlsx | SourceFormat::Xls | SourceFormat::Ods => parse_first_sheet(bytes),
    }
}

/// Parses an upload and keeps the required columns.
pub fn read_import(file_name: &str, bytes: &[u8]) -> Result<ImportTable, ImportError> {
    let raw = parse_upload(file_name, bytes)?;
    tracing::debug!(
        file = file_name,
        columns = raw.headers.len(),
        rows = raw.rows.len(),
        "upload parsed"
    );
    project_required(raw)
}

#[cfg(test)]
mod tests {
    use lotes_core::animal::{CellValue, REQUIRED_COLUMNS};

    use super::*;

    fn html_with(headers: &[&str], cells: &[&str]) -> Vec<u8> {
        let head: String = headers.iter().map(|h| format!("<th>{h}</th>")).collect();
        let row: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<html><body><table><tr>{head}</tr><tr>{row}</tr></table></body></html>")
            .into_bytes()
    }

    #[test]
    fn test_read_import_projects_required_columns() {
        let mut headers = vec!["Extra"];
        headers.extend(REQUIRED_COLUMNS);
        let mut cells = vec!["ignorado"];
        cells.extend(std::iter::repeat("1").take(REQUIRED_COLUMNS.len()));

        let table = read_import("leilao.html", &html_with(&headers, &cells)).unwrap();

        assert_eq!(table.columns, REQUIRED_COLUMNS.to_vec());
        assert_eq!(table.row_count(), 1);
        assert!(table.rows[0].iter().all(|c| c == &CellValue::Integer(1)));
    }

    #[test]
    fn test_read_import_reports_missing_columns() {
        let err = read_import("leilao.html", &html_with(&["Lacre"], &["1"])).unwrap_err();

        match err {
            ImportError::MissingColumns(missing) => {
                assert_eq!(missing.len(), REQUIRED_COLUMNS.len() - 1);
                assert!(!missing.contains(&"Lacre".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_upload_rejects_other_extensions() {
        assert_eq!(
            parse_upload("dados.csv", b"a,b").unwrap_err(),
            ImportError::UnsupportedFormat("dados.csv".to_string())
        );
    }
}
