//! Functional core of the lotes dashboard.
//!
//! Domain types, the batch report aggregation, duplicate grouping, import
//! validation and CSV export. Nothing in this crate performs I/O; the server
//! crate owns SQLite, the file system and HTTP.

pub mod animal;
pub mod backup;
pub mod dashboard;
pub mod duplicates;
pub mod export;
pub mod import;
pub mod lote;
pub mod report;
pub mod storage;
