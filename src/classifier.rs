//! Photo classification: maps a JPEG to a single pantry item label.

use base64::Engine;

use crate::error::{PantryError, Result};
use crate::openai::{ChatMessage, ContentPart, ImageUrl, OpenAiClient};

/// Reply the model gives for anything that is not a pantry food
pub const NOT_PANTRY_ITEM: &str = "not pantry item";

const CLASSIFY_PROMPT: &str = "What pantry item is in this image? If it's a pantry item typically found in a pantry, respond with just the name of the item. If it's not a typical pantry item or not a food item at all, respond with 'not pantry item'.";

const CLASSIFY_MAX_TOKENS: u32 = 50;

/// Outcome of a successful classification request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Recognized item name, trimmed
    PantryItem(String),
    /// The image is valid but shows nothing that belongs in a pantry
    NotPantryItem,
}

impl Classification {
    /// Interpret raw model output
    pub fn from_reply(reply: &str) -> Self {
        let label = reply.trim();
        if label.eq_ignore_ascii_case(NOT_PANTRY_ITEM) {
            Classification::NotPantryItem
        } else {
            Classification::PantryItem(label.to_string())
        }
    }
}

/// Vision client for identifying pantry items in photos
#[derive(Clone)]
pub struct Classifier {
    api: OpenAiClient,
}

impl Classifier {
    pub fn new(api: OpenAiClient) -> Self {
        Self { api }
    }

    /// Classify one JPEG image. No retries: a failure ends this attempt.
    pub async fn classify(&self, image: &[u8]) -> Result<Classification> {
        log::info!("Sending {} byte image for classification", image.len());
        let messages = vec![ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: CLASSIFY_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: jpeg_data_url(image),
                },
            },
        ])];

        let reply = self
            .api
            .complete(messages, CLASSIFY_MAX_TOKENS)
            .await
            .map_err(|e| {
                log::error!("Image classification failed: {}", e);
                PantryError::ClassificationFailed(e)
            })?;

        let classification = Classification::from_reply(&reply);
        log::info!("Classified image as: {:?}", classification);
        Ok(classification)
    }
}

/// Encode bytes as a `data:image/jpeg;base64,` URL
pub fn jpeg_data_url(image: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}
