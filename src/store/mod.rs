//! Inventory store backends
//!
//! A store is a collection of documents keyed by normalized item name, each
//! holding a quantity counter. The controller only ever talks to the
//! [`PantryStore`] trait; the backend is picked at startup.

mod firestore;
mod sqlite;

pub use firestore::FirestoreStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::PantryItem;

/// Stored document body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub count: u32,
}

/// Result of [`PantryStore::adjust`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Document now holds this count
    Written(u32),
    /// Count reached zero and the document was removed
    Deleted,
    /// No document existed and none was created
    Missing,
}

/// Document store holding pantry counts.
#[async_trait]
pub trait PantryStore: Send + Sync {
    /// Read one document
    async fn get(&self, id: &str) -> Result<Option<ItemDocument>>;

    /// Upsert a document. A count of zero deletes it instead.
    async fn set(&self, id: &str, doc: ItemDocument) -> Result<()>;

    /// Delete a document; deleting a missing id succeeds
    async fn delete(&self, id: &str) -> Result<()>;

    /// All documents, in store order
    async fn list_all(&self) -> Result<Vec<PantryItem>>;

    /// Add `delta` to a document's count, deleting it if the result is <= 0.
    ///
    /// When the document is missing and `create_missing` is set, it is created
    /// with `delta` (if positive). The default is a plain read followed by a
    /// write, so two concurrent callers can lose an update; backends with
    /// transactions override it.
    async fn adjust(&self, id: &str, delta: i64, create_missing: bool) -> Result<Adjustment> {
        match self.get(id).await? {
            Some(doc) => {
                let next = i64::from(doc.count) + delta;
                if next <= 0 {
                    self.delete(id).await?;
                    Ok(Adjustment::Deleted)
                } else {
                    let count = clamp_count(next);
                    self.set(id, ItemDocument { count }).await?;
                    Ok(Adjustment::Written(count))
                }
            }
            None if create_missing && delta > 0 => {
                let count = clamp_count(delta);
                self.set(id, ItemDocument { count }).await?;
                Ok(Adjustment::Written(count))
            }
            None => Ok(Adjustment::Missing),
        }
    }
}

pub(crate) fn clamp_count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Open the backend selected by configuration
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn PantryStore>> {
    match config {
        StoreConfig::Sqlite { path } => Ok(Arc::new(SqliteStore::open(path)?)),
        StoreConfig::Firestore {
            project_id,
            collection,
            api_key,
        } => Ok(Arc::new(FirestoreStore::new(
            project_id.clone(),
            collection.clone(),
            api_key.clone(),
        ))),
    }
}
