//! SQLite repository implementation.
//!
//! Implements the repository traits from `lotes_core::storage` using SQLite.

use std::path::Path;

use async_trait::async_trait;
use chrono::Local;
use rusqlite::{params, params_from_iter, OptionalExtension};
use tokio_rusqlite::Connection;

use lotes_core::animal::{
    pick_column, AnimalError, AnimalRecord, CellValue, OutsideRow, COL_LACRE, COL_PROPRIETARIO,
    COL_TOTAL_ANIMAIS, COL_TOTAL_F, COL_TOTAL_M, LACRE_CANDIDATES, OWNER_CANDIDATES,
    SERIE_CANDIDATES,
};
use lotes_core::dashboard::{DashboardStats, HeadTotals};
use lotes_core::duplicates::DuplicateGroup;
use lotes_core::import::ImportTable;
use lotes_core::lote::{
    check_insertion, format_timestamp, validate_numero, Lote, LoteError, LoteSummary,
    StatusChange,
};
use lotes_core::storage::{
    AnimalRepository, DuplicateRepository, LoteRepository, RepositoryError, Result,
    StatsRepository,
};

use super::conversions::{
    cell_to_value, declared_type, quote_ident, row_to_animal, row_to_lote, row_to_lote_summary,
    row_to_outside, value_ref_to_cell,
};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::schema;

const ANIMAIS: &str = "animais";
const LOTES: &str = "lotes";
const LOTE_ITENS: &str = "lote_itens";

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn now_timestamp() -> String {
    format_timestamp(&Local::now().naive_local())
}

fn table_exists(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(schema::TABLE_EXISTS, [name], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
}

/// Column names of a table in order; empty when the table is missing.
fn table_columns(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    rows.collect()
}

/// Runs a `SELECT rowid, * ...` style query and reads animal records.
fn query_animals<P: rusqlite::Params>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Vec<AnimalRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .skip(1)
        .map(|name| name.to_string())
        .collect();
    let rows = stmt.query_map(params, |row| row_to_animal(row, &columns))?;
    rows.collect()
}

fn scalar_i64(conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<i64> {
    conn.query_row(sql, [], |row| row.get(0))
}

fn column_sum(conn: &rusqlite::Connection, column: &str) -> rusqlite::Result<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM({}), 0) FROM animais",
        quote_ident(column)
    );
    conn.query_row(&sql, [], |row| row.get(0))
}

fn lotes_of(conn: &rusqlite::Connection, rowid: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(schema::SELECT_LOTES_OF_ANIMAL)?;
    let rows = stmt.query_map([rowid], |row| row.get(0))?;
    rows.collect()
}

/// Creates the batch tables and brings a legacy `lotes` table up to date.
fn bootstrap(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(schema::CREATE_TABLES)?;

    let existing = table_columns(conn, LOTES)?;
    for (column, alter) in schema::LEGACY_LOTE_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            conn.execute(alter, [])?;
            tracing::info!(column, "added missing column to lotes");
        }
    }

    if let Err(e) = conn.execute(schema::CREATE_UNIQUE_ANIMAL_INDEX, []) {
        tracing::warn!(
            error = %e,
            "some animals are linked to more than one lote; one-lote-per-animal index not created"
        );
    }
    Ok(())
}

/// Result of an insertion attempt, decided inside the transaction.
enum Insertion {
    Linked,
    Refused(LoteError),
    UnknownAnimal,
}

/// SQLite-based repository implementation.
///
/// Provides async access to the `animais`, `lotes` and `lote_itens` tables.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Batch tables are created automatically.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::from_connection(conn).await
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::from_connection(conn).await
    }

    /// Wraps an open connection, bootstrapping the schema.
    pub async fn from_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| bootstrap(conn).map_err(wrap_err))
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(Self { conn })
    }
}

// ============================================================================
// AnimalRepository implementation
// ============================================================================

#[async_trait]
impl AnimalRepository for SqliteRepository {
    async fn columns(&self) -> Result<Vec<String>> {
        self.conn
            .call(|conn| table_columns(conn, ANIMAIS).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }

    async fn list_animals(&self) -> Result<Vec<AnimalRecord>> {
        self.conn
            .call(|conn| {
                if !table_exists(conn, ANIMAIS).map_err(wrap_err)? {
                    return Ok(Vec::new());
                }
                query_animals(conn, schema::SELECT_ANIMALS, []).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }

    async fn get_animal(&self, rowid: i64) -> Result<Option<AnimalRecord>> {
        self.conn
            .call(move |conn| {
                if !table_exists(conn, ANIMAIS).map_err(wrap_err)? {
                    return Ok(None);
                }
                let records = query_animals(conn, schema::SELECT_ANIMAL_BY_ROWID, [rowid])
                    .map_err(wrap_err)?;
                Ok(records.into_iter().next())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Animal", rowid.to_string()))
    }

    async fn find_by_lacre(&self, lacre: &str) -> Result<Vec<AnimalRecord>> {
        let lacre = lacre.trim().to_string();
        if lacre.is_empty() {
            return Ok(Vec::new());
        }
        let as_integer: Option<i64> = lacre.parse().ok();

        self.conn
            .call(move |conn| {
                let columns = table_columns(conn, ANIMAIS).map_err(wrap_err)?;
                if !columns.iter().any(|c| c == COL_LACRE) {
                    return Ok(Vec::new());
                }
                query_animals(
                    conn,
                    schema::SELECT_ANIMALS_BY_LACRE,
                    params![lacre, as_integer],
                )
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }

    async fn update_animal(&self, rowid: i64, values: &[(String, CellValue)]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        let columns = self.columns().await?;
        if let Some((unknown, _)) = values.iter().find(|(name, _)| !columns.contains(name)) {
            return Err(AnimalError::UnknownColumn(unknown.clone()).into());
        }

        let set_clause = values
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", quote_ident(name), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE animais SET {set_clause} WHERE rowid = ?{}",
            values.len() + 1
        );
        let mut bound: Vec<rusqlite::types::Value> =
            values.iter().map(|(_, value)| cell_to_value(value)).collect();
        bound.push(rusqlite::types::Value::Integer(rowid));

        let changed = self
            .conn
            .call(move |conn| {
                conn.execute(&sql, params_from_iter(bound.iter()))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Animal", rowid.to_string()))?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity_type: "Animal",
                id: rowid.to_string(),
            });
        }
        tracing::debug!(rowid, columns = values.len(), "animal updated");
        Ok(())
    }

    async fn replace_animals(&self, table: &ImportTable) -> Result<usize> {
        let table = table.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute("DROP TABLE IF EXISTS animais", [])
                    .map_err(wrap_err)?;

                let definitions = table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let kind = declared_type(table.rows.iter().filter_map(|row| row.get(i)));
                        format!("{} {kind}", quote_ident(name))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                tx.execute(&format!("CREATE TABLE animais ({definitions})"), [])
                    .map_err(wrap_err)?;

                let names = table
                    .columns
                    .iter()
                    .map(|name| quote_ident(name))
                    .collect::<Vec<_>>()
                    .join(", ");
                let placeholders = (1..=table.columns.len())
                    .map(|i| format!("?{i}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                {
                    let mut stmt = tx
                        .prepare(&format!(
                            "INSERT INTO animais ({names}) VALUES ({placeholders})"
                        ))
                        .map_err(wrap_err)?;
                    for row in &table.rows {
                        stmt.execute(params_from_iter(row.iter().map(cell_to_value)))
                            .map_err(wrap_err)?;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(table.rows.len())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }

    async fn animals_outside_lotes(&self) -> Result<Vec<OutsideRow>> {
        self.conn
            .call(|conn| {
                let columns = table_columns(conn, ANIMAIS).map_err(wrap_err)?;
                if columns.is_empty() {
                    return Ok(Vec::new());
                }

                let qualified = |name: &str| format!("a.{}", quote_ident(name));
                let serie = pick_column(&SERIE_CANDIDATES, &columns)
                    .map(qualified)
                    .unwrap_or_else(|| "a.rowid".to_string());
                let lacre = pick_column(&LACRE_CANDIDATES, &columns)
                    .map(qualified)
                    .unwrap_or_else(|| "NULL".to_string());
                let owner = pick_column(&OWNER_CANDIDATES, &columns)
                    .map(qualified)
                    .unwrap_or_else(|| "NULL".to_string());

                let mut sql = format!("SELECT {serie}, {lacre}, {owner} FROM animais a");
                if table_exists(conn, LOTE_ITENS).map_err(wrap_err)? {
                    sql.push_str(
                        " WHERE NOT EXISTS \
                         (SELECT 1 FROM lote_itens li WHERE li.animal_rowid = a.rowid)",
                    );
                }
                sql.push_str(" ORDER BY a.rowid");

                let mut stmt = conn.prepare(&sql).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_outside).map_err(wrap_err)?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }
}

// ============================================================================
// LoteRepository implementation
// ============================================================================

#[async_trait]
impl LoteRepository for SqliteRepository {
    async fn list_lotes(&self) -> Result<Vec<LoteSummary>> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_LOTES_WITH_COUNTS)
                    .map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_lote_summary).map_err(wrap_err)?;

                let mut lotes = Vec::new();
                for row_result in rows {
                    lotes.push(row_result.map_err(wrap_err)?);
                }
                Ok(lotes)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Lote"))
    }

    async fn get_lote(&self, numero: i64) -> Result<Option<Lote>> {
        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_LOTE_BY_NUMERO, [numero], row_to_lote)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Lote", numero.to_string()))
    }

    async fn ensure_lote(&self, numero: i64) -> Result<()> {
        validate_numero(numero)?;
        let now = now_timestamp();

        let created = self
            .conn
            .call(move |conn| {
                conn.execute(schema::INSERT_LOTE_IF_MISSING, params![numero, now])
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Lote", numero.to_string()))?;

        if created > 0 {
            tracing::info!(lote = numero, "lote created");
        }
        Ok(())
    }

    async fn change_status(&self, numero: i64, change: StatusChange) -> Result<Lote> {
        let now = Local::now().naive_local();

        let lote = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let mut lote = tx
                    .query_row(schema::SELECT_LOTE_BY_NUMERO, [numero], row_to_lote)
                    .map_err(wrap_err)?;
                lote.apply(&change, &now);
                tx.execute(
                    schema::UPDATE_LOTE_STATUS,
                    params![lote.status.as_str(), lote.completed_at, lote.gta, numero],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(lote)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Lote", numero.to_string()))?;

        tracing::info!(lote = numero, status = lote.status.as_str(), "lote status changed");
        Ok(lote)
    }

    async fn delete_lote(&self, numero: i64) -> Result<()> {
        let (items, lotes) = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let items = tx
                    .execute(schema::DELETE_LOTE_ITEMS, [numero])
                    .map_err(wrap_err)?;
                let lotes = tx.execute(schema::DELETE_LOTE, [numero]).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok((items, lotes))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Lote", numero.to_string()))?;

        if items == 0 && lotes == 0 {
            return Err(RepositoryError::NotFound {
                entity_type: "Lote",
                id: numero.to_string(),
            });
        }
        tracing::info!(lote = numero, items, "lote deleted");
        Ok(())
    }

    async fn lote_items(&self, numero: i64) -> Result<Vec<AnimalRecord>> {
        self.conn
            .call(move |conn| {
                if !table_exists(conn, ANIMAIS).map_err(wrap_err)? {
                    return Ok(Vec::new());
                }
                query_animals(conn, schema::SELECT_LOTE_ANIMALS, [numero]).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Lote", numero.to_string()))
    }

    async fn add_item(&self, numero: i64, rowid: i64) -> Result<()> {
        validate_numero(numero)?;
        let now = now_timestamp();

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;

                let animal_exists = table_exists(&tx, ANIMAIS).map_err(wrap_err)?
                    && tx
                        .query_row(schema::ANIMAL_EXISTS, [rowid], |_| Ok(()))
                        .optional()
                        .map_err(wrap_err)?
                        .is_some();
                if !animal_exists {
                    return Ok(Insertion::UnknownAnimal);
                }

                let current = lotes_of(&tx, rowid).map_err(wrap_err)?;
                if let Err(refusal) = check_insertion(numero, &current) {
                    return Ok(Insertion::Refused(refusal));
                }

                tx.execute(schema::INSERT_LOTE_IF_MISSING, params![numero, now])
                    .map_err(wrap_err)?;
                tx.execute(schema::INSERT_LOTE_ITEM, params![numero, rowid])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(Insertion::Linked)
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error_with_id(e, "LoteItem", format!("{numero}/{rowid}"))
            })?;

        match outcome {
            Insertion::Linked => {
                tracing::info!(lote = numero, rowid, "animal added to lote");
                Ok(())
            }
            Insertion::Refused(refusal) => Err(refusal.into()),
            Insertion::UnknownAnimal => Err(RepositoryError::NotFound {
                entity_type: "Animal",
                id: rowid.to_string(),
            }),
        }
    }

    async fn remove_item(&self, numero: i64, rowid: i64) -> Result<()> {
        let removed = self
            .conn
            .call(move |conn| {
                conn.execute(schema::DELETE_LOTE_ITEM, [numero, rowid])
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error_with_id(e, "LoteItem", format!("{numero}/{rowid}"))
            })?;

        if removed == 0 {
            return Err(RepositoryError::NotFound {
                entity_type: "LoteItem",
                id: format!("{numero}/{rowid}"),
            });
        }
        tracing::info!(lote = numero, rowid, "animal removed from lote");
        Ok(())
    }

    async fn lotes_of_animal(&self, rowid: i64) -> Result<Vec<i64>> {
        self.conn
            .call(move |conn| lotes_of(conn, rowid).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Animal", rowid.to_string()))
    }
}

// ============================================================================
// DuplicateRepository implementation
// ============================================================================

#[async_trait]
impl DuplicateRepository for SqliteRepository {
    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>> {
        self.conn
            .call(|conn| {
                let columns = table_columns(conn, ANIMAIS).map_err(wrap_err)?;
                if !columns.iter().any(|c| c == COL_LACRE) {
                    return Ok(Vec::new());
                }

                let mut stmt = conn
                    .prepare(schema::SELECT_DUPLICATE_GROUPS)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(DuplicateGroup {
                            lacre: value_ref_to_cell(row.get_ref(0)?).to_string(),
                            count: row.get(1)?,
                        })
                    })
                    .map_err(wrap_err)?;
                rows.collect::<rusqlite::Result<Vec<_>>>().map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }

    async fn animals_with_tag(&self, lacre: &str) -> Result<Vec<AnimalRecord>> {
        let lacre = lacre.trim().to_string();

        self.conn
            .call(move |conn| {
                let columns = table_columns(conn, ANIMAIS).map_err(wrap_err)?;
                if !columns.iter().any(|c| c == COL_LACRE) {
                    return Ok(Vec::new());
                }
                query_animals(conn, schema::SELECT_ANIMALS_WITH_TAG, [lacre]).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Animal"))
    }
}

// ============================================================================
// StatsRepository implementation
// ============================================================================

#[async_trait]
impl StatsRepository for SqliteRepository {
    async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.conn
            .call(|conn| {
                let mut stats = DashboardStats::default();
                let animal_columns = table_columns(conn, ANIMAIS).map_err(wrap_err)?;
                let has_links = table_exists(conn, LOTE_ITENS).map_err(wrap_err)?;
                let has = |name: &str| animal_columns.iter().any(|c| c == name);

                if !animal_columns.is_empty() {
                    stats.total_animals =
                        scalar_i64(conn, schema::COUNT_ANIMALS).map_err(wrap_err)?;

                    if has(COL_LACRE) {
                        let (tags, rows) = conn
                            .query_row(schema::COUNT_DUPLICATE_TAGS, [], |row| {
                                Ok((row.get(0)?, row.get(1)?))
                            })
                            .map_err(wrap_err)?;
                        stats.duplicate_tags = tags;
                        stats.duplicate_rows = rows;
                        stats.animals_without_tag =
                            scalar_i64(conn, schema::COUNT_ANIMALS_WITHOUT_TAG)
                                .map_err(wrap_err)?;
                        stats.distinct_tags =
                            scalar_i64(conn, schema::COUNT_DISTINCT_TAGS).map_err(wrap_err)?;
                    }

                    if has_links {
                        stats.animals_in_lotes =
                            scalar_i64(conn, schema::COUNT_ANIMALS_IN_LOTES).map_err(wrap_err)?;
                        stats.animals_outside =
                            scalar_i64(conn, schema::COUNT_ANIMALS_OUTSIDE_LOTES)
                                .map_err(wrap_err)?;
                    } else {
                        stats.animals_outside = stats.total_animals;
                    }

                    if has(COL_PROPRIETARIO) {
                        stats.distinct_owners =
                            scalar_i64(conn, schema::COUNT_DISTINCT_OWNERS).map_err(wrap_err)?;
                    }

                    if has(COL_TOTAL_M) || has(COL_TOTAL_F) || has(COL_TOTAL_ANIMAIS) {
                        let sum = |column: &str| -> rusqlite::Result<f64> {
                            if has(column) {
                                column_sum(conn, column)
                            } else {
                                Ok(0.0)
                            }
                        };
                        stats.head_totals = Some(HeadTotals {
                            male: sum(COL_TOTAL_M).map_err(wrap_err)?,
                            female: sum(COL_TOTAL_F).map_err(wrap_err)?,
                            all: sum(COL_TOTAL_ANIMAIS).map_err(wrap_err)?,
                        });
                    }
                }

                if table_exists(conn, LOTES).map_err(wrap_err)? {
                    let (total, pending, completed) = conn
                        .query_row(schema::COUNT_LOTES_BY_STATUS, [], |row| {
                            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                        })
                        .map_err(wrap_err)?;
                    stats.total_lotes = total;
                    stats.pending_lotes = pending;
                    stats.completed_lotes = completed;
                }

                if has_links {
                    let (items, with_items, mean) = conn
                        .query_row(schema::COUNT_LOTE_ITEMS, [], |row| {
                            Ok((row.get(0)?, row.get(1)?, row.get::<_, Option<f64>>(2)?))
                        })
                        .map_err(wrap_err)?;
                    stats.items_in_lotes = items;
                    stats.lotes_with_items = with_items;
                    stats.mean_items_per_lote = mean.unwrap_or(0.0);
                }

                Ok(stats)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Dashboard"))
    }

    async fn ping(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Database"))
    }
}
