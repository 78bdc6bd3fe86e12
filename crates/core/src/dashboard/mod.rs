//! Home page figures.

use serde::Serialize;

/// Counters shown on the dashboard. Missing tables yield zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub duplicate_tags: i64,
    pub duplicate_rows: i64,
    pub total_lotes: i64,
    pub pending_lotes: i64,
    pub completed_lotes: i64,
    pub items_in_lotes: i64,
    pub total_animals: i64,
    pub animals_in_lotes: i64,
    pub animals_outside: i64,
    pub animals_without_tag: i64,
    pub distinct_tags: i64,
    pub distinct_owners: i64,
    pub lotes_with_items: i64,
    pub mean_items_per_lote: f64,
    /// Sums of `Total M`, `Total F` and `Total Animais`, when those columns exist.
    pub head_totals: Option<HeadTotals>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeadTotals {
    pub male: f64,
    pub female: f64,
    pub all: f64,
}

impl DashboardStats {
    pub fn empty_lotes(&self) -> i64 {
        (self.total_lotes - self.lotes_with_items).max(0)
    }

    /// Share of animals linked to a batch, in percent.
    pub fn coverage_percent(&self) -> f64 {
        if self.total_animals == 0 {
            0.0
        } else {
            self.animals_in_lotes as f64 / self.total_animals as f64 * 100.0
        }
    }

    pub fn coverage_label(&self) -> String {
        format!("{:.1}%", self.coverage_percent())
    }

    pub fn mean_items_label(&self) -> String {
        format!("{:.1}", self.mean_items_per_lote)
    }
}

/// Human-readable byte size with one decimal (`B`, `KB`, `MB`, `GB`, `TB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
