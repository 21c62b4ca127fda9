//! Action boundary between presentation and the pantry core.
//!
//! Each user action maps to one method here. Failures come back as
//! [`PantryError`]; callers show [`PantryError::user_message`] and move on.
//! Nothing is retried.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::classifier::{Classification, Classifier};
use crate::config::Config;
use crate::controller::{InventoryController, InventorySnapshot};
use crate::error::{PantryError, Result};
use crate::openai::OpenAiClient;
use crate::recipe::RecipeGenerator;
use crate::render::{parse_recipe, RecipeBlock};
use crate::store::PantryStore;

/// Message shown when a photo does not show a pantry item
pub const REJECTED_MESSAGE: &str = "Please try with a pantry item.";

/// Classification and recipe clients, present only with an API credential
#[derive(Clone)]
pub struct Assistant {
    pub classifier: Classifier,
    pub recipes: RecipeGenerator,
}

impl Assistant {
    pub fn new(api: OpenAiClient) -> Self {
        Self {
            classifier: Classifier::new(api.clone()),
            recipes: RecipeGenerator::new(api),
        }
    }

    /// Build from configuration; `None` when no API key is set
    pub fn from_config(config: &Config) -> Option<Self> {
        config.openai_api_key.as_ref().map(|key| {
            Self::new(
                OpenAiClient::new(key.clone())
                    .with_base_url(config.openai_base_url.clone())
                    .with_model(config.openai_model.clone()),
            )
        })
    }
}

/// Result of adding an item from a photo
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhotoOutcome {
    Added {
        label: String,
        snapshot: Arc<InventorySnapshot>,
    },
    /// Valid image, but not food kept in a pantry; nothing was added
    Rejected { message: &'static str },
}

/// Generated recipe, raw and structured
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub ingredients: Vec<String>,
    pub text: String,
    pub blocks: Vec<RecipeBlock>,
}

/// Clears the busy flag when the assistant request ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PantrySession {
    controller: InventoryController,
    assistant: Option<Assistant>,
    busy: AtomicBool,
}

impl PantrySession {
    pub fn new(store: Arc<dyn PantryStore>, assistant: Option<Assistant>) -> Self {
        if assistant.is_none() {
            log::warn!("Assistant disabled: photo classification and recipes are unavailable");
        }
        Self {
            controller: InventoryController::new(store),
            assistant,
            busy: AtomicBool::new(false),
        }
    }

    pub fn controller(&self) -> &InventoryController {
        &self.controller
    }

    pub fn assistant_enabled(&self) -> bool {
        self.assistant.is_some()
    }

    /// Whether a classification or recipe request is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn assistant(&self) -> Result<&Assistant> {
        self.assistant.as_ref().ok_or(PantryError::AssistantDisabled)
    }

    fn begin_request(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("Rejected assistant request: another one is in flight");
            return Err(PantryError::Busy);
        }
        Ok(BusyGuard(&self.busy))
    }

    pub async fn refresh(&self) -> Result<Arc<InventorySnapshot>> {
        self.controller.refresh().await
    }

    pub async fn add_by_name(&self, name: &str) -> Result<Arc<InventorySnapshot>> {
        self.controller.add_item(name).await
    }

    pub async fn increase_count(&self, key: &str) -> Result<Arc<InventorySnapshot>> {
        self.controller.increase_count(key).await
    }

    pub async fn decrease_count(&self, key: &str) -> Result<Arc<InventorySnapshot>> {
        self.controller.decrease_count(key).await
    }

    pub async fn remove_item(&self, key: &str) -> Result<Arc<InventorySnapshot>> {
        self.controller.remove_item(key).await
    }

    pub fn set_search_filter(&self, term: &str) -> Arc<InventorySnapshot> {
        self.controller.set_search_filter(term)
    }

    /// Classify a JPEG and add the recognized item.
    pub async fn add_by_photo(&self, image: &[u8]) -> Result<PhotoOutcome> {
        let assistant = self.assistant()?;
        let _guard = self.begin_request()?;

        match assistant.classifier.classify(image).await? {
            Classification::PantryItem(label) => {
                let snapshot = self.controller.add_item(&label).await?;
                Ok(PhotoOutcome::Added { label, snapshot })
            }
            Classification::NotPantryItem => {
                log::info!("Photo rejected: not a pantry item");
                Ok(PhotoOutcome::Rejected {
                    message: REJECTED_MESSAGE,
                })
            }
        }
    }

    /// Generate a recipe from everything currently in the store.
    pub async fn generate_recipe(&self) -> Result<Recipe> {
        let assistant = self.assistant()?;
        let _guard = self.begin_request()?;

        let ingredients = self.controller.refresh().await?.keys();
        if ingredients.is_empty() {
            return Err(PantryError::NoIngredients);
        }

        let text = assistant.recipes.generate(&ingredients).await?;
        let blocks = parse_recipe(&text);
        Ok(Recipe {
            ingredients,
            text,
            blocks,
        })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
