//! Application state with repository-based storage.
//!
//! This module defines the shared application state that is passed to all
//! request handlers. Storage is reached through a repository trait object that
//! can be swapped when a backup is restored.

use std::sync::Arc;

use tokio::sync::{RwLock as TokioRwLock, RwLockWriteGuard};
use uuid::Uuid;

use lotes_core::import::ImportTable;
use lotes_core::storage::Repository;

use crate::backup::BackupStore;
use crate::config::Config;
use crate::storage::SqliteRepository;

/// A parsed upload waiting for the explicit save step.
#[derive(Debug, Clone)]
pub struct PendingImport {
    pub token: Uuid,
    pub file_name: String,
    pub table: ImportTable,
}

/// Shared application state.
///
/// This is cloned for each request handler and contains shared resources
/// including the repository trait object for database access.
#[derive(Clone)]
pub struct AppState {
    /// Active repository.
    /// Wrapped in RwLock so a restore can reopen the database while no
    /// other request holds it.
    repository: Arc<TokioRwLock<Arc<dyn Repository>>>,
    /// Last previewed import. A new preview replaces it.
    pending_import: Arc<TokioRwLock<Option<PendingImport>>>,
    /// Database file and backup directory operations.
    pub backups: Arc<BackupStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState with the given repository and configuration.
    pub fn new(repository: Arc<dyn Repository>, config: Config) -> Self {
        let backups = BackupStore::new(&config.database, &config.backups_dir);

        Self {
            repository: Arc::new(TokioRwLock::new(repository)),
            pending_import: Arc::new(TokioRwLock::new(None)),
            backups: Arc::new(backups),
            config: Arc::new(config),
        }
    }

    /// Opens the configured database file, creating the batch tables if needed.
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        let repository = SqliteRepository::new(&config.database).await?;
        tracing::info!(database = %config.database.display(), "database opened");

        Ok(Self::new(Arc::new(repository), config))
    }

    /// Get the repository.
    ///
    /// Returns a clone of the Arc, allowing callers to hold a reference
    /// even if the repository is swapped.
    pub async fn repo(&self) -> Arc<dyn Repository> {
        self.repository.read().await.clone()
    }

    /// Exclusive access to the repository slot.
    ///
    /// Held across a restore so no request starts on the file being replaced.
    pub async fn lock_repository(&self) -> RwLockWriteGuard<'_, Arc<dyn Repository>> {
        self.repository.write().await
    }

    /// Keeps a parsed upload until it is saved, returning its token.
    pub async fn stash_import(&self, file_name: String, table: ImportTable) -> Uuid {
        let token = Uuid::new_v4();
        let mut guard = self.pending_import.write().await;
        if guard.replace(PendingImport {
            token,
            file_name,
            table,
        })
        .is_some()
        {
            tracing::debug!("previous import preview discarded");
        }
        token
    }

    /// Takes the pending import if `token` matches it.
    pub async fn take_import(&self, token: Uuid) -> Option<PendingImport> {
        let mut guard = self.pending_import.write().await;
        match guard.as_ref() {
            Some(pending) if pending.token == token => guard.take(),
            _ => None,
        }
    }

    /// The pending import, if any.
    pub async fn pending_import(&self) -> Option<PendingImport> {
        self.pending_import.read().await.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// State on an in-memory database, with file paths under `dir`.
    pub async fn for_tests(dir: &std::path::Path) -> Self {
        let repository = SqliteRepository::new_in_memory()
            .await
            .expect("in-memory database");
        let config = Config::new(dir.join("dados.db"), dir.join("backups"));

        Self::new(Arc::new(repository), config)
    }
}
