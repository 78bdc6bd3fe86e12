//! CSV export for the duplicate and outside-batch pages.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet tools pick the right
//! encoding.

use thiserror::Error;

use crate::animal::{AnimalRecord, OutsideRow};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// Writes a header row and data rows as CSV, prefixed with a BOM.
pub fn write_csv<I, R>(headers: &[String], rows: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row.into_iter().collect::<Vec<_>>())?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

/// All duplicate rows: `Lacre`, `rowid`, then every table column.
///
/// `groups` pairs each duplicated tag with its rows.
pub fn duplicates_csv(
    columns: &[String],
    groups: &[(String, Vec<AnimalRecord>)],
) -> Result<Vec<u8>, ExportError> {
    let mut headers = vec!["Lacre".to_string(), "rowid".to_string()];
    headers.extend(columns.iter().cloned());

    let rows = groups.iter().flat_map(|(lacre, records)| {
        records.iter().map(move |record| {
            let mut row = vec![lacre.clone(), record.rowid.to_string()];
            row.extend(columns.iter().map(|c| record.text(c)));
            row
        })
    });
    write_csv(&headers, rows)
}

/// The rows of one duplicate group: `rowid` then every table column.
pub fn group_csv(columns: &[String], records: &[AnimalRecord]) -> Result<Vec<u8>, ExportError> {
    let mut headers = vec!["rowid".to_string()];
    headers.extend(columns.iter().cloned());

    let rows = records.iter().map(|record| {
        let mut row = vec![record.rowid.to_string()];
        row.extend(columns.iter().map(|c| record.text(c)));
        row
    });
    write_csv(&headers, rows)
}

/// Animals outside every batch: `Série`, `Lacre`, `Proprietário Origem`.
pub fn outside_csv(rows: &[OutsideRow]) -> Result<Vec<u8>, ExportError> {
    let headers: Vec<String> = ["Série", "Lacre", "Proprietário Origem"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    write_csv(
        &headers,
        rows.iter()
            .map(|r| [r.serie.clone(), r.lacre.clone(), r.proprietario.clone()]),
    )
}

/// File name of a single group's export.
pub fn group_file_name(lacre: &str) -> String {
    let safe: String = lacre
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("duplicatas_{safe}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_csv_starts_with_bom() {
        let bytes = write_csv(&["a".to_string()], vec![vec!["1".to_string()]]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(as_text(&bytes[3..]), "a\n1\n");
    }

    #[test]
    fn test_duplicates_csv_layout() {
        let columns = vec!["Lacre".to_string(), "Proprietário Origem".to_string()];
        let records = vec![
            AnimalRecord::new(4)
                .with("Lacre", 77)
                .with("Proprietário Origem", "Ana, Filhos"),
            AnimalRecord::new(9)
                .with("Lacre", 77)
                .with("Proprietário Origem", "Beto"),
        ];

        let bytes = duplicates_csv(&columns, &[("77".to_string(), records)]).unwrap();

        assert_eq!(
            as_text(&bytes[3..]),
            "Lacre,rowid,Lacre,Proprietário Origem\n77,4,77,\"Ana, Filhos\"\n77,9,77,Beto\n"
        );
    }

    #[test]
    fn test_outside_csv() {
        let rows = vec![OutsideRow {
            serie: "12".into(),
            lacre: "500".into(),
            proprietario: "José".into(),
        }];

        let bytes = outside_csv(&rows).unwrap();

        assert_eq!(
            as_text(&bytes[3..]),
            "Série,Lacre,Proprietário Origem\n12,500,José\n"
        );
    }

    #[test]
    fn test_group_file_name() {
        assert_eq!(group_file_name("123"), "duplicatas_123.csv");
        assert_eq!(group_file_name("A/B 1"), "duplicatas_A_B_1.csv");
    }
}
