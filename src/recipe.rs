//! Recipe generation from the items currently on hand.

use crate::error::{PantryError, Result};
use crate::openai::{ChatMessage, OpenAiClient};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates recipes based on available ingredients.";

const RECIPE_MAX_TOKENS: u32 = 500;

/// User instruction embedding the comma-joined ingredient list
pub fn recipe_prompt(items: &[String]) -> String {
    format!(
        "Generate a recipe using some or all of these ingredients: {}. Provide only a list of ingredients with quantities and succinct step-by-step instructions.",
        items.join(", ")
    )
}

/// Text-generation client producing free-form recipes
#[derive(Clone)]
pub struct RecipeGenerator {
    api: OpenAiClient,
}

impl RecipeGenerator {
    pub fn new(api: OpenAiClient) -> Self {
        Self { api }
    }

    /// Generate a recipe using some or all of `items`.
    ///
    /// Fails with [`PantryError::NoIngredients`] before any request when
    /// `items` is empty. The reply is returned verbatim (trimmed).
    pub async fn generate(&self, items: &[String]) -> Result<String> {
        if items.is_empty() {
            return Err(PantryError::NoIngredients);
        }

        log::info!("Generating recipe with {} ingredients", items.len());
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(recipe_prompt(items)),
        ];

        let recipe = self
            .api
            .complete(messages, RECIPE_MAX_TOKENS)
            .await
            .map_err(|e| {
                log::error!("Recipe generation failed: {}", e);
                PantryError::GenerationFailed(e)
            })?;

        log::debug!("Generated recipe ({} chars)", recipe.len());
        Ok(recipe)
    }
}
