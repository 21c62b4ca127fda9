//! Error types for pantry_manager

use thiserror::Error;

/// Boxed source for store failures (SQLite, Firestore transport, lock poisoning)
pub type StoreSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure talking to a chat-completion style HTTP API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-success HTTP status, with the API's error message when it sent one
    #[error("HTTP error {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Response parsed but did not contain what we asked for
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Unified error type for pantry operations
#[derive(Debug, Error)]
pub enum PantryError {
    /// Reading from or writing to the inventory store failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] StoreSource),
    /// `add_item` was given an empty or whitespace-only name
    #[error("Item name is empty")]
    EmptyItemName,
    /// The vision request failed
    #[error("Failed to classify image: {0}")]
    ClassificationFailed(#[source] ApiError),
    /// Recipe requested for an empty pantry
    #[error("No ingredients found in the pantry.")]
    NoIngredients,
    /// The text-generation request failed
    #[error("Failed to generate recipe: {0}")]
    GenerationFailed(#[source] ApiError),
    /// No API credential configured
    #[error("OpenAI API key is not set")]
    AssistantDisabled,
    /// A classification or recipe request is already in flight
    #[error("Another request is already in progress")]
    Busy,
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
    /// A photo file could not be read
    #[error("Cannot read image {}: {source}", .path.display())]
    ImageUnreadable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Request body missing, malformed or of the wrong type
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PantryError {
    /// Wrap any error as a store failure
    pub fn store(err: impl Into<StoreSource>) -> Self {
        PantryError::StoreUnavailable(err.into())
    }

    /// The single message shown to the user for a failed action.
    pub fn user_message(&self) -> String {
        match self {
            PantryError::StoreUnavailable(_) => {
                "Could not reach the pantry. Please try again.".to_string()
            }
            PantryError::EmptyItemName => "Please enter an item name.".to_string(),
            PantryError::ClassificationFailed(_) => {
                "Failed to classify image. Please try again.".to_string()
            }
            PantryError::NoIngredients => {
                format!("Failed to generate recipe: {}", self)
            }
            PantryError::GenerationFailed(e) => format!("Failed to generate recipe: {}", e),
            PantryError::AssistantDisabled => {
                "OpenAI API key is not set. Image classification and recipes are unavailable."
                    .to_string()
            }
            PantryError::Busy => "Please wait for the current request to finish.".to_string(),
            PantryError::Config(msg) => format!("Configuration error: {}", msg),
            PantryError::ImageUnreadable { path, .. } => {
                format!("Could not read image {}.", path.display())
            }
            PantryError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
        }
    }
}

impl From<rusqlite::Error> for PantryError {
    fn from(err: rusqlite::Error) -> Self {
        PantryError::StoreUnavailable(Box::new(err))
    }
}

/// Result alias for pantry operations
pub type Result<T> = std::result::Result<T, PantryError>;
