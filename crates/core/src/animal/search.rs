use serde::Serialize;

use super::columns::{COL_LACRE, COL_PROPRIETARIO, COL_SERIE};
use super::types::AnimalRecord;

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-insensitive substring match on tag, owner or serial.
///
/// A blank term matches every record.
pub fn matches_term(record: &AnimalRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    [COL_LACRE, COL_PROPRIETARIO, COL_SERIE]
        .iter()
        .any(|column| contains_ci(&record.text(column), &term))
}

pub fn filter_animals<'a>(records: &'a [AnimalRecord], term: &str) -> Vec<&'a AnimalRecord> {
    records.iter().filter(|r| matches_term(r, term)).collect()
}

/// An animal with no batch link, projected to the columns shown on the
/// "outside batches" page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutsideRow {
    pub serie: String,
    pub lacre: String,
    pub proprietario: String,
}

impl OutsideRow {
    fn matches(&self, term: &str) -> bool {
        contains_ci(&self.serie, term)
            || contains_ci(&self.lacre, term)
            || contains_ci(&self.proprietario, term)
    }
}

pub fn filter_outside(rows: Vec<OutsideRow>, term: &str) -> Vec<OutsideRow> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return rows;
    }
    rows.into_iter().filter(|row| row.matches(&term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal(rowid: i64, serie: &str, lacre: i64, owner: &str) -> AnimalRecord {
        AnimalRecord::new(rowid)
            .with(COL_SERIE, serie)
            .with(COL_LACRE, lacre)
            .with(COL_PROPRIETARIO, owner)
    }

    #[test]
    fn test_matches_any_searchable_column() {
        let record = animal(1, "ABC-77", 5501, "Fazenda Santa Rita");

        assert!(matches_term(&record, "5501"));
        assert!(matches_term(&record, "santa"));
        assert!(matches_term(&record, "abc"));
        assert!(matches_term(&record, "  "));
        assert!(!matches_term(&record, "boa vista"));
    }

    #[test]
    fn test_filter_animals() {
        let records = vec![
            animal(1, "S1", 100, "Ana"),
            animal(2, "S2", 200, "Bruno"),
            animal(3, "S3", 1000, "Carla"),
        ];

        let hits: Vec<i64> = filter_animals(&records, "100")
            .iter()
            .map(|r| r.rowid)
            .collect();
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn test_filter_outside() {
        let rows = vec![
            OutsideRow {
                serie: "10".into(),
                lacre: "900".into(),
                proprietario: "José".into(),
            },
            OutsideRow {
                serie: "11".into(),
                lacre: "901".into(),
                proprietario: "Maria".into(),
            },
        ];

        assert_eq!(filter_outside(rows.clone(), "").len(), 2);
        let hits = filter_outside(rows, "MARIA");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lacre, "901");
    }
}
