//! Database download, backup list and restore.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Multipart, State},
    response::Response,
};

use lotes_core::backup::{restore_message, BackupError, FileInfo};

use crate::{backup::RestoreUpload, state::AppState, storage::SqliteRepository};

use super::{
    dados::read_file_field,
    flash::{redirect_with_flash, Flash, FlashMessage},
    template::{attachment, HtmlTemplate, SQLITE},
    AppError,
};

#[derive(Template)]
#[template(path = "backup.html")]
struct BackupTemplate {
    flash: Option<FlashMessage>,
    database: Option<FileInfo>,
    database_path: String,
    backups_dir: String,
    backups: Vec<FileInfo>,
}

/// Handler for the backup page (GET /backup).
pub async fn backup_page(
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, AppError> {
    let backups = match state.backups.list_backups().await {
        Ok(backups) => backups,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list backups");
            Vec::new()
        }
    };

    Ok(flash.consume(HtmlTemplate(BackupTemplate {
        flash: flash.0.clone(),
        database: state.backups.database_info().await,
        database_path: state.config.database.display().to_string(),
        backups_dir: state.config.backups_dir.display().to_string(),
        backups,
    })))
}

/// Streams the current database file (GET /backup/download).
pub async fn download_database(State(state): State<AppState>) -> Result<Response, AppError> {
    let bytes = match state.backups.read_database().await {
        Ok(bytes) => bytes,
        Err(BackupError::DatabaseMissing) => {
            return Ok(redirect_with_flash(
                "/backup",
                FlashMessage::info(BackupError::DatabaseMissing.to_string()),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let file_name = state
        .config
        .database
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dados.db".to_string());

    Ok(attachment(SQLITE, &file_name, bytes))
}

/// Message for a refused restore. Validation failures are the user's to fix.
fn restore_refusal(error: &BackupError) -> FlashMessage {
    match error {
        BackupError::NotConfirmed
        | BackupError::MissingFile
        | BackupError::UnsupportedExtension(_)
        | BackupError::InvalidHeader
        | BackupError::IntegrityCheckFailed(_) => FlashMessage::info(error.to_string()),
        BackupError::RolledBack | BackupError::DatabaseMissing | BackupError::Io(_) => {
            FlashMessage::error(error.to_string())
        }
    }
}

fn checked(fields: &[(String, String)], name: &str) -> bool {
    fields.iter().any(|(field, _)| field == name)
}

/// Replaces the database with an uploaded file (POST /backup/restaurar).
///
/// Multipart fields: `arquivo`, `confirmar` and `backup_antes` (checkboxes
/// count as set when present).
pub async fn restore_database(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut fields = Vec::new();
    let file = read_file_field(&mut multipart, &mut fields).await?;
    let (file_name, bytes) = file.unwrap_or_default();

    let upload = RestoreUpload {
        file_name,
        bytes,
        confirmed: checked(&fields, "confirmar"),
        backup_first: checked(&fields, "backup_antes"),
    };

    // Requests arriving during the swap wait here for the reopened repository.
    // A handle taken before the lock still points at the replaced file.
    let mut slot = state.lock_repository().await;
    let outcome = match state.backups.restore(upload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "restore refused");
            return Ok(redirect_with_flash("/backup", restore_refusal(&e)));
        }
    };

    let repository = SqliteRepository::new(&state.config.database).await?;
    *slot = Arc::new(repository);
    drop(slot);
    tracing::info!(auto_backup = ?outcome.auto_backup, "database restored and reopened");

    Ok(redirect_with_flash(
        "/backup",
        FlashMessage::success(restore_message(outcome.auto_backup.as_deref())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_refusal_levels() {
        assert_eq!(
            restore_refusal(&BackupError::InvalidHeader).message_type,
            "info"
        );
        assert_eq!(
            restore_refusal(&BackupError::RolledBack).message_type,
            "error"
        );
    }

    #[test]
    fn test_checked_fields() {
        let fields = vec![("confirmar".to_string(), "on".to_string())];
        assert!(checked(&fields, "confirmar"));
        assert!(!checked(&fields, "backup_antes"));
    }
}
