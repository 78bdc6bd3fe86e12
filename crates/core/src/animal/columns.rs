//! Column names of the `animais` table.

pub const COL_SERIE: &str = "N.º Série";
pub const COL_DATA_EMISSAO: &str = "Data Emissão";
pub const COL_PROPRIETARIO: &str = "Proprietário Origem";
pub const COL_MUNICIPIO: &str = "Município Origem";
pub const COL_TOTAL_M: &str = "Total M";
pub const COL_TOTAL_F: &str = "Total F";
pub const COL_TOTAL_ANIMAIS: &str = "Total Animais";
pub const COL_LACRE: &str = "Lacre";

/// Columns every import must provide, in storage order.
pub const REQUIRED_COLUMNS: [&str; 18] = [
    COL_SERIE,
    COL_DATA_EMISSAO,
    COL_PROPRIETARIO,
    COL_MUNICIPIO,
    "M 0 - 8",
    "F 0 - 8",
    "M 9 - 12",
    "F 9 - 12",
    "M 13 - 24",
    "F 13 - 24",
    "M 25 - 36",
    "F 25 - 36",
    "M 36 +",
    "F 36 +",
    COL_TOTAL_M,
    COL_TOTAL_F,
    COL_TOTAL_ANIMAIS,
    COL_LACRE,
];

/// Alternative names for the serial number column.
pub const SERIE_CANDIDATES: [&str; 6] = [
    "N.º Série",
    "Nº Série",
    "Numero Série",
    "N_Serie",
    "Serie",
    "Série",
];

/// Alternative names for the tag column.
pub const LACRE_CANDIDATES: [&str; 3] = ["Lacre", "LACRE", "lacre"];

/// Alternative names for the owner column.
pub const OWNER_CANDIDATES: [&str; 5] = [
    "Proprietário Origem",
    "Proprietario Origem",
    "Proprietário",
    "Proprietario",
    "Origem",
];

/// Returns the first candidate present in `columns`.
pub fn pick_column<'a>(candidates: &[&'a str], columns: &[String]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| columns.iter().any(|c| c == candidate))
}
