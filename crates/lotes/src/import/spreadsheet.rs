use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use lotes_core::animal::CellValue;
use lotes_core::import::{ImportError, RawTable};
use lotes_core::lote::TIMESTAMP_FORMAT;

/// Largest float that still converts to an exact integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(n) => CellValue::Integer(*n),
        // Spreadsheets store every number as a float
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT => {
            CellValue::Integer(*f as i64)
        }
        Data::Float(f) => CellValue::Real(*f),
        Data::Bool(b) => CellValue::Integer(i64::from(*b)),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::Text(datetime.format(TIMESTAMP_FORMAT).to_string()),
            None => CellValue::Real(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn header_text(data: &Data) -> String {
    data.to_string().trim().to_string()
}

/// Reads the first sheet of an xlsx, xls or ods workbook.
///
/// The first row of the used range holds the headers.
pub fn parse_first_sheet(bytes: &[u8]) -> Result<RawTable, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoTable)?
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or(ImportError::NoTable)?
        .iter()
        .map(header_text)
        .collect();
    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .collect();

    Ok(RawTable { headers, rows })
}
