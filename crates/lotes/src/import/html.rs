use std::borrow::Cow;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use lotes_core::animal::CellValue;
use lotes_core::import::{ImportError, RawTable};

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector to parse"));
static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("row selector to parse"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("cell selector to parse"));

/// Decodes the upload as UTF-8, falling back to Latin-1.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Text content of a cell with whitespace collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads the first `<table>` of an HTML document.
///
/// The first row holds the headers; every following row with cells is data.
pub fn parse_html_table(bytes: &[u8]) -> Result<RawTable, ImportError> {
    let text = decode(bytes);
    let document = Html::parse_document(&text);
    let table = document.select(&TABLE).next().ok_or(ImportError::NoTable)?;

    let mut rows = table
        .select(&ROW)
        .map(|row| row.select(&CELL).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());

    let headers = rows.next().ok_or(ImportError::NoTable)?;
    let rows = rows
        .map(|cells| cells.iter().map(|c| CellValue::infer(c)).collect::<Vec<_>>())
        .collect();

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_table_is_read() {
        let html = br#"
            <html><body>
            <table>
              <thead><tr><th>N.&ordm; S&eacute;rie</th><th> Lacre </th><th>Peso</th></tr></thead>
              <tbody>
                <tr><td>12</td><td>  4401 </td><td>350,5</td></tr>
                <tr><td>13</td><td></td><td>2.5</td></tr>
              </tbody>
            </table>
            <table><tr><th>Outra</th></tr></table>
            </body></html>"#;

        let table = parse_html_table(html).unwrap();

        assert_eq!(table.headers, vec!["N.º Série", "Lacre", "Peso"]);
        assert_eq!(
            table.rows,
            vec![
                vec![
                    CellValue::Integer(12),
                    CellValue::Integer(4401),
                    CellValue::from("350,5"),
                ],
                vec![CellValue::Integer(13), CellValue::Null, CellValue::Real(2.5)],
            ]
        );
    }

    #[test]
    fn test_latin1_upload_is_decoded() {
        let html = b"<table><tr><th>Propriet\xe1rio Origem</th></tr><tr><td>Jo\xe3o</td></tr></table>";

        let table = parse_html_table(html).unwrap();

        assert_eq!(table.headers, vec!["Proprietário Origem"]);
        assert_eq!(table.rows, vec![vec![CellValue::from("João")]]);
    }

    #[test]
    fn test_document_without_table() {
        assert_eq!(
            parse_html_table(b"<html><body><p>vazio</p></body></html>").unwrap_err(),
            ImportError::NoTable
        );
    }
}
