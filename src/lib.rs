//! Pantry Manager - household pantry inventory
//!
//! Keeps a count per pantry item in a document store (SQLite locally or
//! Firestore remotely), recognizes items from photos, and generates
//! recipes from whatever is on hand.

pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod openai;
pub mod recipe;
pub mod render;
pub mod session;
pub mod store;
pub mod web;

pub use config::Config;
pub use controller::{InventoryController, InventorySnapshot};
pub use error::{PantryError, Result};
pub use models::PantryItem;
pub use session::{Assistant, PantrySession, PhotoOutcome, Recipe};
pub use store::{open_store, PantryStore};
