use async_trait::async_trait;

use crate::animal::{AnimalRecord, CellValue, OutsideRow};
use crate::dashboard::DashboardStats;
use crate::duplicates::DuplicateGroup;
use crate::import::ImportTable;
use crate::lote::{Lote, LoteSummary, StatusChange};

use super::Result;

/// Repository for the `animais` table.
#[async_trait]
pub trait AnimalRepository: Send + Sync {
    /// Column names in table order; empty when the table does not exist.
    async fn columns(&self) -> Result<Vec<String>>;

    /// Every row with its rowid.
    async fn list_animals(&self) -> Result<Vec<AnimalRecord>>;

    /// Gets a row by its rowid.
    async fn get_animal(&self, rowid: i64) -> Result<Option<AnimalRecord>>;

    /// Rows whose tag equals `lacre`, as text or as an integer.
    async fn find_by_lacre(&self, lacre: &str) -> Result<Vec<AnimalRecord>>;

    /// Updates the given columns of a row. Unknown columns are rejected.
    async fn update_animal(&self, rowid: i64, values: &[(String, CellValue)]) -> Result<()>;

    /// Replaces the whole table with imported data. Returns the rows written.
    async fn replace_animals(&self, table: &ImportTable) -> Result<usize>;

    /// Animals with no batch link, projected to serial, tag and owner.
    async fn animals_outside_lotes(&self) -> Result<Vec<OutsideRow>>;
}

/// Repository for batches and their links.
#[async_trait]
pub trait LoteRepository: Send + Sync {
    /// Every batch with its item count.
    async fn list_lotes(&self) -> Result<Vec<LoteSummary>>;

    /// Gets a batch by its number.
    async fn get_lote(&self, numero: i64) -> Result<Option<Lote>>;

    /// Creates the batch if it does not exist.
    async fn ensure_lote(&self, numero: i64) -> Result<()>;

    /// Concludes or reopens a batch and returns its new state.
    async fn change_status(&self, numero: i64, change: StatusChange) -> Result<Lote>;

    /// Deletes a batch and all of its links.
    async fn delete_lote(&self, numero: i64) -> Result<()>;

    /// Linked animals in link order.
    async fn lote_items(&self, numero: i64) -> Result<Vec<AnimalRecord>>;

    /// Links an animal to a batch, creating the batch when needed.
    ///
    /// Fails with [`crate::lote::LoteError`] when the animal is already linked
    /// to this or another batch.
    async fn add_item(&self, numero: i64, rowid: i64) -> Result<()>;

    /// Removes a link.
    async fn remove_item(&self, numero: i64, rowid: i64) -> Result<()>;

    /// Batches an animal is linked to.
    async fn lotes_of_animal(&self, rowid: i64) -> Result<Vec<i64>>;
}

/// Repository for duplicate tag queries.
#[async_trait]
pub trait DuplicateRepository: Send + Sync {
    /// Tags on more than one row, ordered by count desc then tag.
    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>>;

    /// Rows whose trimmed tag equals `lacre`, by rowid.
    async fn animals_with_tag(&self, lacre: &str) -> Result<Vec<AnimalRecord>>;
}

/// Repository for the dashboard counters.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn dashboard_stats(&self) -> Result<DashboardStats>;

    /// Runs a trivial query to check the connection.
    async fn ping(&self) -> Result<()>;
}

/// Everything the server needs from storage.
pub trait Repository:
    AnimalRepository + LoteRepository + DuplicateRepository + StatsRepository
{
}

impl<T> Repository for T where
    T: AnimalRepository + LoteRepository + DuplicateRepository + StatsRepository
{
}
