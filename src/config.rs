//! Startup configuration read from the process environment.

use std::path::PathBuf;

use crate::error::{PantryError, Result};
use crate::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_COLLECTION: &str = "pantry";

/// Which document store backs the pantry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Sqlite {
        path: PathBuf,
    },
    Firestore {
        project_id: String,
        collection: String,
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Completion API credential; `None` disables classification and recipes
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub store: StoreConfig,
}

/// Returns the default database path: ~/.local/share/pantry_manager/pantry.db
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pantry_manager")
        .join("pantry.db")
}

impl Config {
    /// Read configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let openai_api_key = var("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            log::warn!("OPENAI_API_KEY is not set: image classification and recipes are disabled");
        }

        let store = match var("PANTRY_FIRESTORE_PROJECT") {
            Some(project_id) => StoreConfig::Firestore {
                project_id,
                collection: var("PANTRY_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
                api_key: var("PANTRY_FIRESTORE_API_KEY"),
            },
            None => StoreConfig::Sqlite {
                path: var("PANTRY_DB")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_db_path),
            },
        };

        Self {
            openai_api_key,
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            store,
        }
    }

    /// Reject values that cannot work at all
    pub fn validate(&self) -> Result<()> {
        if !self.openai_base_url.starts_with("http://")
            && !self.openai_base_url.starts_with("https://")
        {
            return Err(PantryError::Config(format!(
                "OPENAI_BASE_URL must be an http(s) URL, got {}",
                self.openai_base_url
            )));
        }
        if let StoreConfig::Firestore { project_id, .. } = &self.store {
            if project_id.contains('/') {
                return Err(PantryError::Config(format!(
                    "invalid Firestore project id: {}",
                    project_id
                )));
            }
        }
        Ok(())
    }

    /// Whether classification and recipe generation can run
    pub fn assistant_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}
