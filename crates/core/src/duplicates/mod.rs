//! Duplicate tag detection helpers.

use serde::Serialize;

/// Columns shown first on a duplicate group, when present.
pub const PREFERRED_COLUMNS: [&str; 7] = [
    "rowid",
    "N.º Série",
    "Lacre",
    "Proprietário Origem",
    "Idade",
    "Idade (meses)",
    "Sexo",
];

/// Maximum number of columns shown for a group.
pub const MAX_DISPLAY_COLUMNS: usize = 12;

/// A tag value that occurs on more than one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub lacre: String,
    pub count: i64,
}

/// Totals shown above the group list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateSummary {
    pub distinct_tags: usize,
    pub rows: i64,
}

pub fn summarize(groups: &[DuplicateGroup]) -> DuplicateSummary {
    DuplicateSummary {
        distinct_tags: groups.len(),
        rows: groups.iter().map(|g| g.count).sum(),
    }
}

/// Keeps groups whose tag contains `term`, ignoring case.
pub fn filter_groups(groups: Vec<DuplicateGroup>, term: &str) -> Vec<DuplicateGroup> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return groups;
    }
    groups
        .into_iter()
        .filter(|g| g.lacre.to_lowercase().contains(&term))
        .collect()
}

/// Orders groups by count (descending), then tag.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.lacre.cmp(&b.lacre)));
}

/// Picks the columns shown for a group's rows.
///
/// `rowid` and the preferred columns present in the table come first, then
/// the remaining table columns until [`MAX_DISPLAY_COLUMNS`] is reached.
pub fn display_columns(columns: &[String]) -> Vec<String> {
    let mut shown: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|p| **p == "rowid" || columns.iter().any(|c| c == *p))
        .map(|p| p.to_string())
        .collect();

    for column in columns {
        if shown.len() >= MAX_DISPLAY_COLUMNS {
            break;
        }
        if !shown.contains(column) {
            shown.push(column.clone());
        }
    }
    shown
}
