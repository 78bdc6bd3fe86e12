//! Database file operations: download, local backups and restore.
//!
//! File work runs on the blocking pool. Naming and validation rules live in
//! `lotes_core::backup`.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tempfile::NamedTempFile;

use lotes_core::backup::{
    backup_file_name, check_integrity_result, check_upload_name, has_sqlite_header,
    newest_backups, BackupError, FileInfo, OLD_DATABASE_NAME,
};

/// An uploaded restore request.
#[derive(Debug, Clone, Default)]
pub struct RestoreUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub confirmed: bool,
    pub backup_first: bool,
}

/// What a successful restore did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Name of the backup taken before the swap, if any.
    pub auto_backup: Option<String>,
}

/// The live database file and its backup directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    database: PathBuf,
    backups_dir: PathBuf,
}

impl BackupStore {
    pub fn new(database: impl Into<PathBuf>, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            backups_dir: backups_dir.into(),
        }
    }

    /// Name, size and modification time of the live database.
    pub async fn database_info(&self) -> Option<FileInfo> {
        let database = self.database.clone();
        tokio::task::spawn_blocking(move || file_info(&database).ok())
            .await
            .ok()
            .flatten()
    }

    /// Reads the whole database file for download.
    pub async fn read_database(&self) -> Result<Vec<u8>, BackupError> {
        let database = self.database.clone();
        run_blocking(move || {
            if !database.exists() {
                return Err(BackupError::DatabaseMissing);
            }
            Ok(fs::read(&database)?)
        })
        .await
    }

    /// Local backups, newest first.
    pub async fn list_backups(&self) -> Result<Vec<FileInfo>, BackupError> {
        let dir = self.backups_dir.clone();
        run_blocking(move || list_backups(&dir)).await
    }

    /// The newest local backup, if any.
    pub async fn last_backup(&self) -> Option<FileInfo> {
        self.list_backups()
            .await
            .ok()
            .and_then(|backups| backups.into_iter().next())
    }

    /// Validates an upload and swaps it in place of the live database.
    ///
    /// The caller must keep every connection on the live file idle until this
    /// returns, then reopen it.
    pub async fn restore(&self, upload: RestoreUpload) -> Result<RestoreOutcome, BackupError> {
        let database = self.database.clone();
        let dir = self.backups_dir.clone();
        run_blocking(move || restore(&database, &dir, upload)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, BackupError>
where
    F: FnOnce() -> Result<T, BackupError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackupError::Io(e.to_string()))?
}

fn file_info(path: &Path) -> std::io::Result<FileInfo> {
    let metadata = fs::metadata(path)?;
    let modified: DateTime<Local> = metadata.modified()?.into();
    Ok(FileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: metadata.len(),
        modified: modified.naive_local(),
    })
}

fn list_backups(dir: &Path) -> Result<Vec<FileInfo>, BackupError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            entries.push(file_info(&path)?);
        }
    }
    Ok(newest_backups(entries))
}

fn create_backup(database: &Path, dir: &Path) -> Result<String, BackupError> {
    if !database.exists() {
        return Err(BackupError::DatabaseMissing);
    }
    fs::create_dir_all(dir)?;
    let name = backup_file_name(&Local::now().naive_local());
    fs::copy(database, dir.join(&name))?;
    tracing::info!(backup = %name, "database backup created");
    Ok(name)
}

/// Runs `PRAGMA integrity_check` on a read-only connection.
fn integrity_check(path: &Path) -> Result<(), BackupError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| BackupError::IntegrityCheckFailed(e.to_string()))?;
    let result: Option<String> = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .optional()
        .map_err(|e| BackupError::IntegrityCheckFailed(e.to_string()))?;
    check_integrity_result(result.as_deref())
}

fn validate_file(path: &Path) -> Result<(), BackupError> {
    let header = fs::read(path)?;
    if !has_sqlite_header(&header) {
        return Err(BackupError::InvalidHeader);
    }
    integrity_check(path)
}

/// Moves `incoming` over `database`, keeping the previous file at `old`
/// until `verify` accepts the result. On failure the previous file is put
/// back.
fn swap_in(
    database: &Path,
    old: &Path,
    incoming: NamedTempFile,
    verify: impl Fn(&Path) -> Result<(), BackupError>,
) -> Result<(), BackupError> {
    if old.exists() {
        fs::remove_file(old)?;
    }
    let had_database = database.exists();
    if had_database {
        fs::rename(database, old)?;
    }

    if let Err(e) = incoming.persist(database) {
        if had_database {
            fs::rename(old, database)?;
        }
        return Err(BackupError::Io(e.error.to_string()));
    }

    if let Err(e) = verify(database) {
        tracing::warn!(error = %e, "restored database failed validation, rolling back");
        if database.exists() {
            fs::remove_file(database)?;
        }
        if had_database {
            fs::rename(old, database)?;
        }
        return Err(BackupError::RolledBack);
    }

    if old.exists() {
        fs::remove_file(old)?;
    }
    Ok(())
}

fn restore(
    database: &Path,
    backups_dir: &Path,
    upload: RestoreUpload,
) -> Result<RestoreOutcome, BackupError> {
    if upload.bytes.is_empty() {
        return Err(BackupError::MissingFile);
    }
    check_upload_name(&upload.file_name)?;
    if !upload.confirmed {
        return Err(BackupError::NotConfirmed);
    }
    if !has_sqlite_header(&upload.bytes) {
        return Err(BackupError::InvalidHeader);
    }

    let dir = match database.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    // Dropped on every early return, which removes the file.
    let mut incoming = NamedTempFile::new_in(&dir)?;
    incoming.write_all(&upload.bytes)?;
    incoming.flush()?;
    integrity_check(incoming.path())?;

    let auto_backup = if upload.backup_first && database.exists() {
        Some(create_backup(database, backups_dir)?)
    } else {
        None
    };

    swap_in(database, &dir.join(OLD_DATABASE_NAME), incoming, validate_file)?;

    tracing::info!(
        file = %upload.file_name,
        auto_backup = auto_backup.as_deref().unwrap_or("-"),
        "database restored"
    );
    Ok(RestoreOutcome { auto_backup })
}
