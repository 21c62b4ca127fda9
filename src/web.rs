//! Web server for the pantry UI
//!
//! Exposes the session's actions as a JSON API. Classification and recipe
//! requests are proxied here so the API credential never leaves the server.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::controller::InventorySnapshot;
use crate::error::PantryError;
use crate::session::{PantrySession, PhotoOutcome, Recipe};

/// Largest accepted photo upload
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
struct AppState {
    session: Arc<PantrySession>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, PantryError>;

impl IntoResponse for PantryError {
    fn into_response(self) -> Response {
        let status = match self {
            PantryError::EmptyItemName
            | PantryError::InvalidRequest(_)
            | PantryError::ImageUnreadable { .. } => StatusCode::BAD_REQUEST,
            PantryError::Busy => StatusCode::CONFLICT,
            PantryError::NoIngredients => StatusCode::UNPROCESSABLE_ENTITY,
            PantryError::ClassificationFailed(_) | PantryError::GenerationFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            PantryError::StoreUnavailable(_) | PantryError::AssistantDisabled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PantryError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::warn!("Request failed ({}): {}", status, self);

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: Some(self.user_message()),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct Status {
    assistant_enabled: bool,
    busy: bool,
    item_count: usize,
}

#[derive(Deserialize)]
struct AddItemRequest {
    name: String,
}

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    term: String,
}

/// Unwrap a JSON body, keeping extractor failures inside the response envelope
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, PantryError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| PantryError::InvalidRequest(rejection.body_text()))
}

/// GET /api/status
async fn status_handler(State(state): State<AppState>) -> Json<ApiResponse<Status>> {
    let snapshot = state.session.controller().snapshot();
    ApiResponse::ok(Status {
        assistant_enabled: state.session.assistant_enabled(),
        busy: state.session.is_busy(),
        item_count: snapshot.items.len(),
    })
}

/// GET /api/items?search=...
///
/// `search` filters this response only; without it the shared filter applies.
async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Arc<InventorySnapshot>> {
    let snapshot = state.session.refresh().await?;
    Ok(ApiResponse::ok(match query.search {
        Some(term) => Arc::new(snapshot.with_search(&term)),
        None => snapshot,
    }))
}

/// PUT /api/search {"term": "..."}
///
/// Sets the process-wide filter seen by every client that lists without
/// its own `search` parameter.
async fn search_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Arc<InventorySnapshot>> {
    let request = json_body(payload)?;
    Ok(ApiResponse::ok(state.session.set_search_filter(&request.term)))
}

/// POST /api/items {"name": "..."}
async fn add_handler(
    State(state): State<AppState>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<Arc<InventorySnapshot>> {
    let request = json_body(payload)?;
    Ok(ApiResponse::ok(
        state.session.add_by_name(&request.name).await?,
    ))
}

/// POST /api/items/{key}/increment
async fn increment_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Arc<InventorySnapshot>> {
    Ok(ApiResponse::ok(state.session.increase_count(&key).await?))
}

/// POST /api/items/{key}/decrement
async fn decrement_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Arc<InventorySnapshot>> {
    Ok(ApiResponse::ok(state.session.decrease_count(&key).await?))
}

/// DELETE /api/items/{key}
async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Arc<InventorySnapshot>> {
    Ok(ApiResponse::ok(state.session.remove_item(&key).await?))
}

/// POST /api/classify (raw JPEG body)
async fn classify_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<PhotoOutcome> {
    Ok(ApiResponse::ok(state.session.add_by_photo(&body).await?))
}

/// POST /api/recipe
async fn recipe_handler(State(state): State<AppState>) -> ApiResult<Recipe> {
    Ok(ApiResponse::ok(state.session.generate_recipe().await?))
}

/// Build the web server router
pub fn create_router(session: Arc<PantrySession>) -> Router {
    let state = AppState { session };

    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/items", get(list_handler).post(add_handler))
        .route("/api/search", put(search_handler))
        .route("/api/items/{key}/increment", post(increment_handler))
        .route("/api/items/{key}/decrement", post(decrement_handler))
        .route("/api/items/{key}", delete(remove_handler))
        .route(
            "/api/classify",
            post(classify_handler).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/api/recipe", post(recipe_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(
    session: Arc<PantrySession>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = session.refresh().await {
        log::warn!("Initial pantry load failed: {}", e);
    }

    let app = create_router(session);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Pantry API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Pantry API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
