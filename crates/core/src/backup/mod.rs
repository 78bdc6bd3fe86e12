//! Naming and validation rules for database backups.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::dashboard::format_bytes;

/// Magic header of every SQLite 3 database file.
pub const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// Name of the previous database kept while a restore is verified.
pub const OLD_DATABASE_NAME: &str = "dados.old.sqlite";

/// Number of backups listed on the backup page.
pub const LISTED_BACKUPS: usize = 20;

const BACKUP_PREFIX: &str = "dados-";
const BACKUP_SUFFIX: &str = ".sqlite";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackupError {
    #[error("Confirme que deseja substituir o banco atual")]
    NotConfirmed,
    #[error("Nenhum arquivo enviado")]
    MissingFile,
    #[error("Tipo de arquivo não suportado: {0} (use .sqlite ou .db)")]
    UnsupportedExtension(String),
    #[error("Arquivo enviado não parece ser um banco SQLite válido (assinatura inválida)")]
    InvalidHeader,
    #[error("Arquivo enviado não passou no PRAGMA integrity_check: {0}")]
    IntegrityCheckFailed(String),
    #[error("Falha na validação final do banco restaurado. O banco anterior foi recuperado.")]
    RolledBack,
    #[error("Banco de dados não encontrado")]
    DatabaseMissing,
    #[error("Erro de arquivo: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Io(err.to_string())
    }
}

/// `dados-YYYYMMDD-HHMMSS.sqlite`
pub fn backup_file_name(now: &NaiveDateTime) -> String {
    format!(
        "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
        now.format("%Y%m%d-%H%M%S")
    )
}

/// Matches the `dados-*.sqlite` pattern of local backups.
pub fn is_backup_file_name(name: &str) -> bool {
    name.len() > BACKUP_PREFIX.len() + BACKUP_SUFFIX.len()
        && name.starts_with(BACKUP_PREFIX)
        && name.ends_with(BACKUP_SUFFIX)
}

/// Restores accept `.sqlite` and `.db` uploads.
pub fn check_upload_name(name: &str) -> Result<(), BackupError> {
    let lower = name.to_lowercase();
    if lower.ends_with(".sqlite") || lower.ends_with(".db") {
        Ok(())
    } else {
        Err(BackupError::UnsupportedExtension(name.to_string()))
    }
}

pub fn has_sqlite_header(bytes: &[u8]) -> bool {
    bytes.len() >= SQLITE_HEADER.len() && &bytes[..SQLITE_HEADER.len()] == SQLITE_HEADER
}

/// Interprets the first row of `PRAGMA integrity_check`.
pub fn check_integrity_result(result: Option<&str>) -> Result<(), BackupError> {
    match result {
        Some("ok") => Ok(()),
        Some(other) => Err(BackupError::IntegrityCheckFailed(other.to_string())),
        None => Err(BackupError::IntegrityCheckFailed("sem resultado".to_string())),
    }
}

/// A file on disk: a local backup or the live database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub modified: NaiveDateTime,
}

impl FileInfo {
    pub fn size_label(&self) -> String {
        format_bytes(self.size)
    }

    pub fn modified_label(&self) -> String {
        self.modified.format("%d/%m/%Y %H:%M").to_string()
    }
}

/// Newest first, capped at [`LISTED_BACKUPS`].
pub fn newest_backups(mut entries: Vec<FileInfo>) -> Vec<FileInfo> {
    entries.retain(|e| is_backup_file_name(&e.name));
    entries.sort_by(|a, b| b.modified.cmp(&a.modified));
    entries.truncate(LISTED_BACKUPS);
    entries
}

/// Success message of a restore.
pub fn restore_message(auto_backup: Option<&str>) -> String {
    match auto_backup {
        Some(name) => format!("Banco restaurado com sucesso. Backup automático criado: {name}."),
        None => "Banco restaurado com sucesso.".to_string(),
    }
}
