//! Inventory sync controller
//!
//! Owns the in-memory view of the pantry and the mutations that keep it in
//! step with the store. Every mutation is followed by a full re-read of the
//! store, so a session always observes its own writes. State is published as
//! immutable [`InventorySnapshot`]s over a `watch` channel; readers never
//! hold references into mutable state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{PantryError, Result};
use crate::models::{normalize_key, PantryItem};
use crate::store::{Adjustment, PantryStore};

/// Point-in-time view of the pantry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventorySnapshot {
    /// Every item, in store order
    pub items: Vec<PantryItem>,
    /// Active search term ("" means no filter)
    pub search_term: String,
    /// Items matching `search_term`
    pub visible: Vec<PantryItem>,
    /// When the items were last read from the store
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl InventorySnapshot {
    fn build(
        items: Vec<PantryItem>,
        search_term: String,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let visible = filter_items(&items, &search_term);
        Self {
            items,
            search_term,
            visible,
            refreshed_at,
        }
    }

    /// Copy of this snapshot filtered by `term` instead of the active term
    pub fn with_search(&self, term: &str) -> Self {
        Self::build(self.items.clone(), term.to_string(), self.refreshed_at)
    }

    pub fn item(&self, key: &str) -> Option<&PantryItem> {
        self.items.iter().find(|item| item.key == key)
    }

    /// Item keys in store order
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(|item| item.key.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items whose key contains `term`, case-insensitively
pub fn filter_items(items: &[PantryItem], term: &str) -> Vec<PantryItem> {
    items
        .iter()
        .filter(|item| item.matches(term))
        .cloned()
        .collect()
}

pub struct InventoryController {
    store: Arc<dyn PantryStore>,
    state: watch::Sender<Arc<InventorySnapshot>>,
}

impl InventoryController {
    pub fn new(store: Arc<dyn PantryStore>) -> Self {
        let (state, _) = watch::channel(Arc::new(InventorySnapshot::default()));
        Self { store, state }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<InventorySnapshot> {
        self.state.borrow().clone()
    }

    /// Receiver notified after every refresh or filter change
    pub fn subscribe(&self) -> watch::Receiver<Arc<InventorySnapshot>> {
        self.state.subscribe()
    }

    /// Re-read every document and reapply the active search term.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<InventorySnapshot>> {
        let items = self.store.list_all().await.map_err(|e| {
            log::error!("Failed to refresh pantry: {}", e);
            e
        })?;
        log::debug!("Refreshed pantry: {} items", items.len());

        let refreshed_at = Some(Utc::now());
        self.state.send_modify(|current| {
            let term = current.search_term.clone();
            *current = Arc::new(InventorySnapshot::build(items, term, refreshed_at));
        });
        Ok(self.snapshot())
    }

    /// Add one of `name`, creating the item on first use.
    ///
    /// Blank names are rejected before the store is touched.
    pub async fn add_item(&self, name: &str) -> Result<Arc<InventorySnapshot>> {
        let key = normalize_key(name).ok_or(PantryError::EmptyItemName)?;
        let adjustment = self.store.adjust(&key, 1, true).await?;
        log::info!("Added item {}: {:?}", key, adjustment);
        self.refresh().await
    }

    /// Increment an existing item; missing keys are left alone.
    pub async fn increase_count(&self, key: &str) -> Result<Arc<InventorySnapshot>> {
        let adjustment = self.store.adjust(key, 1, false).await?;
        if adjustment == Adjustment::Missing {
            log::debug!("Increase ignored, no such item: {}", key);
        } else {
            log::info!("Increased {}: {:?}", key, adjustment);
        }
        self.refresh().await
    }

    /// Decrement an item, deleting it when the count would reach zero.
    pub async fn decrease_count(&self, key: &str) -> Result<Arc<InventorySnapshot>> {
        let adjustment = self.store.adjust(key, -1, false).await?;
        match adjustment {
            Adjustment::Missing => log::debug!("Decrease ignored, no such item: {}", key),
            Adjustment::Deleted => log::info!("Removed {} (count reached zero)", key),
            Adjustment::Written(count) => log::info!("Decreased {} to {}", key, count),
        }
        self.refresh().await
    }

    /// Delete an item regardless of its count
    pub async fn remove_item(&self, key: &str) -> Result<Arc<InventorySnapshot>> {
        self.store.delete(key).await?;
        log::info!("Removed item {}", key);
        self.refresh().await
    }

    /// Filter the visible list without touching the store
    pub fn set_search_filter(&self, term: &str) -> Arc<InventorySnapshot> {
        self.state.send_modify(|current| {
            *current = Arc::new(InventorySnapshot::build(
                current.items.clone(),
                term.to_string(),
                current.refreshed_at,
            ));
        });
        self.snapshot()
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
