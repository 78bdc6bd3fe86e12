mod columns;
mod edit;
mod error;
mod search;
mod types;

pub use columns::{
    pick_column, LACRE_CANDIDATES, OWNER_CANDIDATES, REQUIRED_COLUMNS, SERIE_CANDIDATES,
    COL_DATA_EMISSAO, COL_LACRE, COL_MUNICIPIO, COL_PROPRIETARIO, COL_SERIE, COL_TOTAL_ANIMAIS,
    COL_TOTAL_F, COL_TOTAL_M,
};
pub use edit::{coerce_submitted, parse_date_like, EditInput, DATE_FORMATS};
pub use error::AnimalError;
pub use search::{filter_animals, filter_outside, matches_term, OutsideRow};
pub use types::{AnimalRecord, CellValue};
