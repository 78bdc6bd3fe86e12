use chrono::NaiveDateTime;

use super::error::LoteError;
use super::types::{LoteStatus, LoteSummary};

/// Storage format of `criado_em` and `concluido_em`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Example shown in the GTA input.
pub const GTA_PLACEHOLDER: &str = "010101-E";

pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Batch numbers are integers ≥ 1.
pub fn validate_numero(numero: i64) -> Result<i64, LoteError> {
    if numero < 1 {
        return Err(LoteError::InvalidNumber(numero));
    }
    Ok(numero)
}

/// Blank GTA input is stored as NULL.
pub fn normalize_gta(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Decides whether an animal may be linked to `target`, given the batches it
/// is already linked to.
pub fn check_insertion(target: i64, current: &[i64]) -> Result<(), LoteError> {
    if current.contains(&target) {
        return Err(LoteError::AlreadyInLote(target));
    }
    if !current.is_empty() {
        let mut others = current.to_vec();
        others.sort_unstable();
        others.dedup();
        return Err(LoteError::InOtherLotes(others));
    }
    Ok(())
}

/// Batches split by status for the batch grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoteBoard {
    pub pending: Vec<LoteSummary>,
    pub completed: Vec<LoteSummary>,
}

impl LoteBoard {
    /// `"{n} pendente(s) • {m} concluído(s)"`
    pub fn summary_line(&self) -> String {
        format!(
            "{} pendente(s) • {} concluído(s)",
            self.pending.len(),
            self.completed.len()
        )
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    /// Pending batches first, then completed ones.
    pub fn ordered(&self) -> impl Iterator<Item = &LoteSummary> {
        self.pending.iter().chain(self.completed.iter())
    }
}

/// Splits batches into pending and completed, each sorted by number.
pub fn partition_by_status(lotes: Vec<LoteSummary>) -> LoteBoard {
    let (mut completed, mut pending): (Vec<_>, Vec<_>) = lotes
        .into_iter()
        .partition(|l| l.status == LoteStatus::Concluido);
    pending.sort_by_key(|l| l.numero);
    completed.sort_by_key(|l| l.numero);
    LoteBoard { pending, completed }
}
