//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use lotes_core::animal::{AnimalRecord, CellValue, OutsideRow};
use lotes_core::lote::{Lote, LoteStatus, LoteSummary};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Row;

// ============================================================================
// Cell conversions
// ============================================================================

/// Converts a borrowed SQLite value to a cell.
///
/// Blobs never come out of an import; they are shown as their size.
pub fn value_ref_to_cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(n) => CellValue::Integer(n),
        ValueRef::Real(f) => CellValue::Real(f),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Text(format!("<{} bytes>", bytes.len())),
    }
}

/// Converts a cell to an owned SQLite value for binding.
pub fn cell_to_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Integer(n) => Value::Integer(*n),
        CellValue::Real(f) => Value::Real(*f),
        CellValue::Text(s) => Value::Text(s.clone()),
    }
}

/// Reads a column as display text, whatever its storage class.
fn optional_text(row: &Row, idx: usize) -> rusqlite::Result<Option<String>> {
    let cell = value_ref_to_cell(row.get_ref(idx)?);
    Ok(match cell {
        CellValue::Null => None,
        other => Some(other.to_string()),
    })
}

/// Quotes an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared column type for imported data, picked from its values.
///
/// All-integer columns are `INTEGER`, all-numeric columns are `REAL`,
/// anything else is `TEXT`. NULLs are ignored.
pub fn declared_type<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> &'static str {
    let mut declared = "INTEGER";
    for cell in cells {
        match cell {
            CellValue::Null | CellValue::Integer(_) => {}
            CellValue::Real(_) => declared = "REAL",
            CellValue::Text(_) => return "TEXT",
        }
    }
    declared
}

// ============================================================================
// Animal conversions
// ============================================================================

/// Convert a SQLite row to an animal record.
///
/// Expected columns: rowid, then `columns` in order.
pub fn row_to_animal(row: &Row, columns: &[String]) -> rusqlite::Result<AnimalRecord> {
    let rowid: i64 = row.get(0)?;
    let mut fields = Vec::with_capacity(columns.len());
    for (i, name) in columns.iter().enumerate() {
        fields.push((name.clone(), value_ref_to_cell(row.get_ref(i + 1)?)));
    }
    Ok(AnimalRecord { rowid, fields })
}

/// Convert a SQLite row to an outside-batch row.
///
/// Expected columns: serial, tag, owner
pub fn row_to_outside(row: &Row) -> rusqlite::Result<OutsideRow> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(value_ref_to_cell(row.get_ref(idx)?).to_string())
    };
    Ok(OutsideRow {
        serie: text(0)?,
        lacre: text(1)?,
        proprietario: text(2)?,
    })
}

// ============================================================================
// Batch conversions
// ============================================================================

/// Convert a SQLite row to a Lote.
///
/// Expected columns: numero, criado_em, status, concluido_em, gta_saida
pub fn row_to_lote(row: &Row) -> rusqlite::Result<Lote> {
    let status = optional_text(row, 2)?;
    Ok(Lote {
        numero: row.get(0)?,
        created_at: optional_text(row, 1)?,
        status: LoteStatus::from_db(status.as_deref()),
        completed_at: optional_text(row, 3)?,
        gta: optional_text(row, 4)?,
    })
}

/// Convert a SQLite row to a LoteSummary.
///
/// Expected columns: numero, criado_em, status, concluido_em, gta_saida, item count
pub fn row_to_lote_summary(row: &Row) -> rusqlite::Result<LoteSummary> {
    let lote = row_to_lote(row)?;
    Ok(LoteSummary {
        numero: lote.numero,
        status: lote.status,
        created_at: lote.created_at,
        gta: lote.gta,
        items: row.get(5)?,
    })
}
