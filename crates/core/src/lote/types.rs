use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::operations::format_timestamp;

/// Batch status as stored in `lotes.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoteStatus {
    #[default]
    Pendente,
    Concluido,
}

impl LoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoteStatus::Pendente => "pendente",
            LoteStatus::Concluido => "concluido",
        }
    }

    /// Reads a stored status. NULL and unknown values read as pending.
    pub fn from_db(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("concluido") => LoteStatus::Concluido,
            _ => LoteStatus::Pendente,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoteStatus::Pendente => "Pendente",
            LoteStatus::Concluido => "Concluído",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, LoteStatus::Concluido)
    }
}

/// A batch row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lote {
    pub numero: i64,
    pub created_at: Option<String>,
    pub status: LoteStatus,
    pub completed_at: Option<String>,
    pub gta: Option<String>,
}

impl Lote {
    pub fn new(numero: i64) -> Self {
        Self {
            numero,
            created_at: None,
            status: LoteStatus::Pendente,
            completed_at: None,
            gta: None,
        }
    }

    /// Applies a status transition in place.
    pub fn apply(&mut self, change: &StatusChange, now: &NaiveDateTime) {
        self.status = change.target_status();
        self.completed_at = change.completed_at(now);
        self.gta = change.gta().map(str::to_string);
    }
}

/// A batch with its item count, as listed on the batch grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoteSummary {
    pub numero: i64,
    pub status: LoteStatus,
    pub created_at: Option<String>,
    pub gta: Option<String>,
    pub items: i64,
}

/// A status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// `pendente → concluido`, with an optional GTA number.
    Conclude { gta: Option<String> },
    /// `concluido → pendente`, clearing the completion data.
    Reopen,
}

impl StatusChange {
    pub fn target_status(&self) -> LoteStatus {
        match self {
            StatusChange::Conclude { .. } => LoteStatus::Concluido,
            StatusChange::Reopen => LoteStatus::Pendente,
        }
    }

    pub fn completed_at(&self, now: &NaiveDateTime) -> Option<String> {
        match self {
            StatusChange::Conclude { .. } => Some(format_timestamp(now)),
            StatusChange::Reopen => None,
        }
    }

    pub fn gta(&self) -> Option<&str> {
        match self {
            StatusChange::Conclude { gta } => gta.as_deref(),
            StatusChange::Reopen => None,
        }
    }
}
