use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static RANGE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(M|F)\s*(\d{1,2})\s*[-–]\s*(\d{1,2})$")
        .expect("range column pattern to compile")
});

static OPEN_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(M|F)\s*36\s*\+$").expect("36+ column pattern to compile")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern to compile"));

/// Names tried, in order, when looking for an age-in-months column.
pub const AGE_COLUMN_CANDIDATES: [&str; 7] = [
    "Idade",
    "Idade (meses)",
    "Idade_meses",
    "Meses",
    "Meses Idade",
    "Idade em meses",
    "Idade Em Meses",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("f") {
            Sex::F
        } else {
            Sex::M
        }
    }
}

/// A column holding head counts for one sex and an age range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountColumn {
    pub name: String,
    pub sex: Sex,
    pub lo: u32,
    pub hi: u32,
}

/// Folds dash variants to `-`, collapses whitespace and trims.
pub fn normalize_column_name(name: &str) -> String {
    let dashed = name.replace(['–', '—', '−'], "-");
    WHITESPACE.replace_all(&dashed, " ").trim().to_string()
}

fn parse_count_column(name: &str) -> Option<CountColumn> {
    let normalized = normalize_column_name(name);

    if let Some(caps) = RANGE_COLUMN.captures(&normalized) {
        let lo = caps[2].parse().ok()?;
        let hi = caps[3].parse().ok()?;
        return Some(CountColumn {
            name: name.to_string(),
            sex: Sex::parse(&caps[1]),
            lo,
            hi,
        });
    }

    OPEN_COLUMN.captures(&normalized).map(|caps| CountColumn {
        name: name.to_string(),
        sex: Sex::parse(&caps[1]),
        lo: 37,
        hi: 10_000,
    })
}

/// Finds the sex/age head-count columns, in table order.
pub fn detect_count_columns(columns: &[String]) -> Vec<CountColumn> {
    columns
        .iter()
        .filter_map(|c| parse_count_column(c))
        .collect()
}

/// Finds the age-in-months column.
///
/// Candidates are tried in order; a candidate matches a column whose
/// normalised lowercase name equals or contains it.
pub fn detect_age_column(columns: &[String]) -> Option<String> {
    let normalized: Vec<(String, &String)> = columns
        .iter()
        .map(|c| (normalize_column_name(c).to_lowercase(), c))
        .collect();

    AGE_COLUMN_CANDIDATES.iter().find_map(|candidate| {
        let needle = normalize_column_name(candidate).to_lowercase();
        normalized
            .iter()
            .find(|(name, _)| name.contains(&needle))
            .map(|(_, original)| (*original).clone())
    })
}
