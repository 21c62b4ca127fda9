//! Local SQLite pantry store
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Counter adjustments run inside a transaction, so concurrent adds on the
//! same key never lose an increment.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{clamp_count, Adjustment, ItemDocument, PantryStore};
use crate::error::{PantryError, Result};
use crate::models::PantryItem;

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Pantry store backed by a SQLite file (or in-memory database for tests)
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialise the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(PantryError::store)?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        let conn = Connection::open(path)?;
        log::info!("Opened pantry database: {}", path.display());
        Self::from_connection(conn)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PantryError::store("pantry database lock poisoned"))
    }
}

/// Creates the `pantry` table if it does not already exist.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS pantry (
            id          TEXT NOT NULL PRIMARY KEY,
            count       INTEGER NOT NULL CHECK (count >= 1),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    log::debug!("Pantry schema initialized");
    Ok(())
}

fn get_document(conn: &Connection, id: &str) -> DbResult<Option<ItemDocument>> {
    conn.query_row(
        "SELECT count FROM pantry WHERE id = ?1",
        params![id],
        |row| {
            let count: i64 = row.get(0)?;
            Ok(ItemDocument {
                count: clamp_count(count),
            })
        },
    )
    .optional()
}

fn upsert_document(conn: &Connection, id: &str, count: u32) -> DbResult<()> {
    conn.execute(
        "INSERT INTO pantry (id, count, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
             count      = excluded.count,
             updated_at = excluded.updated_at",
        params![id, count],
    )?;
    Ok(())
}

fn delete_document(conn: &Connection, id: &str) -> DbResult<usize> {
    conn.execute("DELETE FROM pantry WHERE id = ?1", params![id])
}

fn list_documents(conn: &Connection) -> DbResult<Vec<PantryItem>> {
    let mut stmt = conn.prepare("SELECT id, count FROM pantry ORDER BY id")?;
    let items = stmt
        .query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(PantryItem::new(row.get::<_, String>(0)?, clamp_count(count)))
        })?
        .collect::<DbResult<Vec<_>>>()?;
    Ok(items)
}

fn adjust_tx(
    tx: &Transaction<'_>,
    id: &str,
    delta: i64,
    create_missing: bool,
) -> DbResult<Adjustment> {
    let current = get_document(tx, id)?;
    let adjustment = match current {
        Some(doc) => {
            let next = i64::from(doc.count) + delta;
            if next <= 0 {
                delete_document(tx, id)?;
                Adjustment::Deleted
            } else {
                let count = clamp_count(next);
                upsert_document(tx, id, count)?;
                Adjustment::Written(count)
            }
        }
        None if create_missing && delta > 0 => {
            let count = clamp_count(delta);
            upsert_document(tx, id, count)?;
            Adjustment::Written(count)
        }
        None => Adjustment::Missing,
    };
    Ok(adjustment)
}

#[async_trait]
impl PantryStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<ItemDocument>> {
        log::debug!("SQLite get: {}", id);
        let conn = self.lock()?;
        Ok(get_document(&conn, id)?)
    }

    async fn set(&self, id: &str, doc: ItemDocument) -> Result<()> {
        log::debug!("SQLite set: {} = {}", id, doc.count);
        let conn = self.lock()?;
        if doc.count == 0 {
            delete_document(&conn, id)?;
        } else {
            upsert_document(&conn, id, doc.count)?;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        log::debug!("SQLite delete: {}", id);
        let conn = self.lock()?;
        let removed = delete_document(&conn, id)?;
        if removed == 0 {
            log::debug!("Delete of missing document ignored: {}", id);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PantryItem>> {
        let conn = self.lock()?;
        let items = list_documents(&conn)?;
        log::debug!("SQLite list: {} documents", items.len());
        Ok(items)
    }

    async fn adjust(&self, id: &str, delta: i64, create_missing: bool) -> Result<Adjustment> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let adjustment = adjust_tx(&tx, id, delta, create_missing)?;
        tx.commit()?;
        log::debug!("SQLite adjust: {} by {} -> {:?}", id, delta, adjustment);
        Ok(adjustment)
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
