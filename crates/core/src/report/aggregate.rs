use std::collections::HashMap;

use serde::Serialize;

use crate::animal::{AnimalRecord, COL_LACRE, COL_PROPRIETARIO, COL_SERIE};

use super::brackets::{Bracket, BracketTarget};
use super::columns::{detect_age_column, detect_count_columns, Sex};

/// Head counts for each of the seven brackets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BracketCounts([i64; 7]);

impl BracketCounts {
    pub fn get(&self, bracket: Bracket) -> i64 {
        self.0[bracket.index()]
    }

    pub fn add(&mut self, bracket: Bracket, count: i64) {
        let slot = &mut self.0[bracket.index()];
        *slot = slot.saturating_add(count);
    }

    pub fn total(&self) -> i64 {
        self.0.iter().fold(0, |acc, v| acc.saturating_add(*v))
    }

    fn merge(&mut self, other: &BracketCounts) {
        for (slot, value) in self.0.iter_mut().zip(other.0) {
            *slot = slot.saturating_add(value);
        }
    }
}

/// One line of the report: a (serial, tag, owner) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub serie: String,
    pub lacre: String,
    pub proprietario: String,
    pub male: BracketCounts,
    pub female: BracketCounts,
}

impl ReportRow {
    fn new(serie: String, lacre: String, proprietario: String) -> Self {
        Self {
            serie,
            lacre,
            proprietario,
            male: BracketCounts::default(),
            female: BracketCounts::default(),
        }
    }

    pub fn counts(&self, sex: Sex) -> &BracketCounts {
        match sex {
            Sex::M => &self.male,
            Sex::F => &self.female,
        }
    }

    fn counts_mut(&mut self, sex: Sex) -> &mut BracketCounts {
        match sex {
            Sex::M => &mut self.male,
            Sex::F => &mut self.female,
        }
    }

    /// Counts interleaved as M, F per bracket, in bracket order.
    pub fn cells(&self) -> Vec<i64> {
        interleave(&self.male, &self.female)
    }
}

fn interleave(male: &BracketCounts, female: &BracketCounts) -> Vec<i64> {
    Bracket::ALL
        .iter()
        .flat_map(|b| [male.get(*b), female.get(*b)])
        .collect()
}

/// The aggregated report of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoteReport {
    pub rows: Vec<ReportRow>,
    pub male_totals: BracketCounts,
    pub female_totals: BracketCounts,
}

impl LoteReport {
    pub fn totals(&self, sex: Sex) -> &BracketCounts {
        match sex {
            Sex::M => &self.male_totals,
            Sex::F => &self.female_totals,
        }
    }

    /// Per-bracket totals interleaved as M, F.
    pub fn total_cells(&self) -> Vec<i64> {
        interleave(&self.male_totals, &self.female_totals)
    }

    pub fn grand_total(&self, sex: Sex) -> i64 {
        self.totals(sex).total()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sort key for tags and serials: the trimmed text as an integer, 0 when it
/// is not one.
pub fn numeric_key(text: &str) -> i64 {
    text.trim().parse().unwrap_or(0)
}

/// Aggregates a batch's linked animals into report rows.
///
/// `columns` are the `animais` column names in table order; `records` are the
/// linked rows in link order.
pub fn build_report(columns: &[String], records: &[AnimalRecord]) -> LoteReport {
    let count_columns = detect_count_columns(columns);
    let targets: Vec<_> = count_columns
        .iter()
        .map(|c| (c, Bracket::target_for_bounds(c.lo, c.hi)))
        .collect();
    let age_column = detect_age_column(columns);

    let mut rows: Vec<ReportRow> = Vec::new();
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for record in records {
        let key = (
            record.text(COL_SERIE),
            record.text(COL_LACRE),
            record.text(COL_PROPRIETARIO),
        );
        let position = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(ReportRow::new(key.0, key.1, key.2));
            rows.len() - 1
        });

        let age_bracket = age_column
            .as_deref()
            .and_then(|col| record.get(col))
            .filter(|value| !value.is_blank())
            .and_then(|value| value.as_f64())
            .and_then(Bracket::for_age);

        for (column, target) in &targets {
            let count = record
                .get(&column.name)
                .and_then(|value| value.as_whole_number())
                .unwrap_or(0);
            if count <= 0 {
                continue;
            }

            let bracket = match target {
                BracketTarget::Single(bracket) => *bracket,
                BracketTarget::Split25To36 => match age_bracket {
                    Some(b @ (Bracket::From25To30 | Bracket::From31To36)) => b,
                    _ => Bracket::From25To30,
                },
            };
            rows[position].counts_mut(column.sex).add(bracket, count);
        }
    }

    rows.sort_by_key(|row| (numeric_key(&row.lacre), numeric_key(&row.serie)));

    let mut report = LoteReport {
        rows,
        ..LoteReport::default()
    };
    for row in &report.rows {
        report.male_totals.merge(&row.male);
        report.female_totals.merge(&row.female);
    }
    report
}

#[cfg(test)]
mod tests {
    use crate::animal::CellValue;

    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn animal(rowid: i64, serie: i64, lacre: i64, owner: &str) -> AnimalRecord {
        AnimalRecord::new(rowid)
            .with(COL_SERIE, serie)
            .with(COL_LACRE, lacre)
            .with(COL_PROPRIETARIO, owner)
    }

    #[test]
    fn test_empty_batch_has_zero_rows_and_totals() {
        let report = build_report(&columns(&["Lacre", "M 0 - 8", "F 0 - 8"]), &[]);

        assert!(report.is_empty());
        assert_eq!(report.row_count(), 0);
        assert_eq!(report.grand_total(Sex::M), 0);
        assert_eq!(report.grand_total(Sex::F), 0);
        assert!(report.total_cells().iter().all(|c| *c == 0));
    }

    #[test]
    fn test_male_13_to_24_goes_to_13_to_18() {
        let cols = columns(&["N.º Série", "Lacre", "Proprietário Origem", "M 13 - 24"]);
        let records = vec![animal(1, 10, 500, "Ana").with("M 13 - 24", 5)];

        let report = build_report(&cols, &records);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].male.get(Bracket::From13To18), 5);
        assert_eq!(report.rows[0].male.get(Bracket::From19To24), 0);
        assert_eq!(report.male_totals.get(Bracket::From13To18), 5);
    }

    #[test]
    fn test_25_to_36_split_by_age_column() {
        let cols = columns(&[
            "N.º Série",
            "Lacre",
            "Proprietário Origem",
            "Idade (meses)",
            "F 25 - 36",
        ]);
        let records = vec![
            animal(1, 1, 100, "A")
                .with("Idade (meses)", 33)
                .with("F 25 - 36", 2),
            animal(2, 2, 101, "B")
                .with("Idade (meses)", 26)
                .with("F 25 - 36", 3),
            animal(3, 3, 102, "C")
                .with("Idade (meses)", CellValue::Null)
                .with("F 25 - 36", 4),
            animal(4, 4, 103, "D")
                .with("Idade (meses)", 50)
                .with("F 25 - 36", 1),
        ];

        let report = build_report(&cols, &records);

        assert_eq!(report.rows[0].female.get(Bracket::From31To36), 2);
        assert_eq!(report.rows[1].female.get(Bracket::From25To30), 3);
        assert_eq!(report.rows[2].female.get(Bracket::From25To30), 4);
        assert_eq!(report.rows[3].female.get(Bracket::From25To30), 1);
        assert_eq!(report.female_totals.get(Bracket::From25To30), 8);
        assert_eq!(report.female_totals.get(Bracket::From31To36), 2);
    }

    #[test]
    fn test_25_to_36_without_age_column_goes_to_25_to_30() {
        let cols = columns(&["N.º Série", "Lacre", "Proprietário Origem", "M 25 - 36"]);
        let records = vec![animal(1, 1, 1, "A").with("M 25 - 36", 6)];

        let report = build_report(&cols, &records);

        assert_eq!(report.male_totals.get(Bracket::From25To30), 6);
        assert_eq!(report.male_totals.get(Bracket::From31To36), 0);
    }

    #[test]
    fn test_rows_grouped_by_triple_and_summed() {
        let cols = columns(&[
            "N.º Série",
            "Lacre",
            "Proprietário Origem",
            "M 0 - 8",
            "F 36 +",
        ]);
        let records = vec![
            animal(1, 7, 300, "Zé").with("M 0 - 8", 2).with("F 36 +", 1),
            animal(2, 7, 300, "Zé").with("M 0 - 8", 3).with("F 36 +", CellValue::Null),
            animal(3, 7, 300, "Outro").with("M 0 - 8", 1).with("F 36 +", 0),
        ];

        let report = build_report(&cols, &records);

        assert_eq!(report.row_count(), 2);
        assert_eq!(report.rows[0].proprietario, "Zé");
        assert_eq!(report.rows[0].male.get(Bracket::UpTo8), 5);
        assert_eq!(report.rows[0].female.get(Bracket::Over36), 1);
        assert_eq!(report.rows[1].male.get(Bracket::UpTo8), 1);
        assert_eq!(report.grand_total(Sex::M), 6);
        assert_eq!(report.grand_total(Sex::F), 1);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let cols = columns(&["N.º Série", "Lacre", "Proprietário Origem", "M 0 - 8", "M 9 - 12"]);
        let records = vec![
            animal(1, 7, 300, "Zé")
                .with("M 0 - 8", i64::MAX - 1)
                .with("M 9 - 12", i64::MAX),
            animal(2, 7, 300, "Zé").with("M 0 - 8", 5),
        ];

        let report = build_report(&cols, &records);

        assert_eq!(report.row_count(), 1);
        assert_eq!(report.rows[0].male.get(Bracket::UpTo8), i64::MAX);
        assert_eq!(report.grand_total(Sex::M), i64::MAX);
    }

    #[test]
    fn test_unparseable_and_negative_counts_are_skipped() {
        let cols = columns(&["N.º Série", "Lacre", "Proprietário Origem", "M 9 - 12"]);
        let records = vec![
            animal(1, 1, 1, "A").with("M 9 - 12", "dois"),
            animal(2, 2, 2, "B").with("M 9 - 12", -4),
            animal(3, 3, 3, "C").with("M 9 - 12", " 3 "),
            animal(4, 4, 4, "D").with("M 9 - 12", CellValue::Real(2.0)),
        ];

        let report = build_report(&cols, &records);

        assert_eq!(report.male_totals.get(Bracket::From9To12), 5);
    }

    #[test]
    fn test_sorted_by_numeric_tag_then_serial() {
        let cols = columns(&["N.º Série", "Lacre", "Proprietário Origem"]);
        let records = vec![
            animal(1, 2, 20, "A"),
            animal(2, 1, 100, "B"),
            animal(3, 1, 20, "C"),
            AnimalRecord::new(4)
                .with(COL_SERIE, 9)
                .with(COL_LACRE, "sem")
                .with(COL_PROPRIETARIO, "D"),
        ];

        let report = build_report(&cols, &records);

        let order: Vec<(&str, &str)> = report
            .rows
            .iter()
            .map(|r| (r.lacre.as_str(), r.serie.as_str()))
            .collect();
        assert_eq!(order, vec![("sem", "9"), ("20", "1"), ("20", "2"), ("100", "1")]);
    }

    #[test]
    fn test_cells_interleave_male_and_female() {
        let mut row = ReportRow::new("1".into(), "2".into(), "X".into());
        row.male.add(Bracket::UpTo8, 4);
        row.female.add(Bracket::UpTo8, 1);
        row.female.add(Bracket::Over36, 9);

        let cells = row.cells();

        assert_eq!(cells.len(), 14);
        assert_eq!(&cells[..2], &[4, 1]);
        assert_eq!(cells[13], 9);
    }

    #[test]
    fn test_numeric_key() {
        assert_eq!(numeric_key("42"), 42);
        assert_eq!(numeric_key(" 7 "), 7);
        assert_eq!(numeric_key("A-1"), 0);
        assert_eq!(numeric_key(""), 0);
    }
}
