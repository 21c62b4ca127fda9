//! Pantry domain types

use serde::{Deserialize, Serialize};

/// One inventory row: a normalized item name and how many are on hand.
///
/// `count` is always at least 1; an item that would drop to zero is deleted
/// from the store instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryItem {
    pub key: String,
    pub count: u32,
}

impl PantryItem {
    pub fn new(key: impl Into<String>, count: u32) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }

    /// Key with its first letter upper-cased, for presentation
    pub fn display_name(&self) -> String {
        let mut chars = self.key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Case-insensitive substring match against the key
    pub fn matches(&self, term: &str) -> bool {
        self.key.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Normalize a user-supplied item name into a store key.
///
/// Returns `None` for empty or whitespace-only input.
pub fn normalize_key(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
