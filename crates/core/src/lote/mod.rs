mod error;
mod operations;
mod types;

pub use error::LoteError;
pub use operations::{
    check_insertion, format_timestamp, normalize_gta, partition_by_status, validate_numero,
    LoteBoard, GTA_PLACEHOLDER, TIMESTAMP_FORMAT,
};
pub use types::{Lote, LoteStatus, LoteSummary, StatusChange};
