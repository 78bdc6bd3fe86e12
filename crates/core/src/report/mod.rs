//! Batch report: head counts per sex and age bracket.

mod aggregate;
mod brackets;
mod columns;

pub use aggregate::{build_report, numeric_key, BracketCounts, LoteReport, ReportRow};
pub use brackets::{Bracket, BracketTarget};
pub use columns::{
    detect_age_column, detect_count_columns, normalize_column_name, CountColumn, Sex,
    AGE_COLUMN_CANDIDATES,
};
