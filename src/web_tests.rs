//! Tests for the pantry JSON API.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::openai::OpenAiClient;
use crate::session::Assistant;
use crate::store::SqliteStore;

fn app_without_assistant() -> Router {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    create_router(Arc::new(PantrySession::new(store, None)))
}

fn app_with_mock(mock_uri: &str) -> Router {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let api = OpenAiClient::new("test-key".to_string()).with_base_url(mock_uri);
    create_router(Arc::new(PantrySession::new(
        store,
        Some(Assistant::new(api)),
    )))
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn visible_keys(body: &Value) -> Vec<String> {
    body["data"]["visible"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["key"].as_str().unwrap().to_string())
        .collect()
}

// ── inventory ────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_items() {
    let app = app_without_assistant();

    let (status, body) = send(
        &app,
        "POST",
        "/api/items",
        Some(serde_json::json!({ "name": "Rice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["items"][0]["key"], "rice");
    assert_eq!(body["data"]["items"][0]["count"], 1);

    let (status, body) = send(&app, "GET", "/api/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(visible_keys(&body), vec!["rice"]);
}

#[tokio::test]
async fn blank_name_is_bad_request() {
    let app = app_without_assistant();

    let (status, body) = send(
        &app,
        "POST",
        "/api/items",
        Some(serde_json::json!({ "name": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Please enter an item name.");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn increment_decrement_and_remove() {
    let app = app_without_assistant();
    send(
        &app,
        "POST",
        "/api/items",
        Some(serde_json::json!({ "name": "oats" })),
    )
    .await;

    let (_, body) = send(&app, "POST", "/api/items/oats/increment", None).await;
    assert_eq!(body["data"]["items"][0]["count"], 2);

    let (_, body) = send(&app, "POST", "/api/items/oats/decrement", None).await;
    assert_eq!(body["data"]["items"][0]["count"], 1);

    let (_, body) = send(&app, "POST", "/api/items/oats/decrement", None).await;
    assert_eq!(body["data"]["items"], serde_json::json!([]));

    send(
        &app,
        "POST",
        "/api/items",
        Some(serde_json::json!({ "name": "honey" })),
    )
    .await;
    let (status, body) = send(&app, "DELETE", "/api/items/honey", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], serde_json::json!([]));
}

#[tokio::test]
async fn keys_with_spaces_are_path_decoded() {
    let app = app_without_assistant();
    send(
        &app,
        "POST",
        "/api/items",
        Some(serde_json::json!({ "name": "Black Beans" })),
    )
    .await;

    let (_, body) = send(&app, "POST", "/api/items/black%20beans/increment", None).await;
    assert_eq!(body["data"]["items"][0]["key"], "black beans");
    assert_eq!(body["data"]["items"][0]["count"], 2);
}

#[tokio::test]
async fn search_filters_visible_items() {
    let app = app_without_assistant();
    for name in ["rice", "beans", "rigatoni"] {
        send(
            &app,
            "POST",
            "/api/items",
            Some(serde_json::json!({ "name": name })),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        "PUT",
        "/api/search",
        Some(serde_json::json!({ "term": "RI" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["search_term"], "RI");
    assert_eq!(visible_keys(&body), vec!["rice", "rigatoni"]);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn list_search_parameter_does_not_change_shared_filter() {
    let app = app_without_assistant();
    for name in ["rice", "beans"] {
        send(
            &app,
            "POST",
            "/api/items",
            Some(serde_json::json!({ "name": name })),
        )
        .await;
    }

    let (status, body) = send(&app, "GET", "/api/items?search=be", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(visible_keys(&body), vec!["beans"]);
    assert_eq!(body["data"]["search_term"], "be");

    let (_, body) = send(&app, "GET", "/api/items", None).await;
    assert_eq!(visible_keys(&body), vec!["beans", "rice"]);
    assert_eq!(body["data"]["search_term"], "");
}

// ── malformed requests ───────────────────────────────────────────────

#[tokio::test]
async fn missing_name_field_stays_in_envelope() {
    let app = app_without_assistant();

    let (status, body) = send(&app, "POST", "/api/items", Some(serde_json::json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request:"));
}

#[tokio::test]
async fn malformed_json_stays_in_envelope() {
    let app = app_without_assistant();
    let request = Request::builder()
        .method("PUT")
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from("{\"term\": "))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_content_type_stays_in_envelope() {
    let app = app_without_assistant();
    let request = Request::builder()
        .method("POST")
        .uri("/api/items")
        .body(Body::from(r#"{"name": "rice"}"#))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
}

// ── status ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_disabled_assistant() {
    let app = app_without_assistant();

    let (status, body) = send(&app, "GET", "/api/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assistant_enabled"], false);
    assert_eq!(body["data"]["busy"], false);
    assert_eq!(body["data"]["item_count"], 0);
}

#[tokio::test]
async fn assistant_routes_unavailable_without_key() {
    let app = app_without_assistant();

    let (status, body) = send(&app, "POST", "/api/recipe", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "POST", "/api/classify", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ── assistant ────────────────────────────────────────────────────────

#[tokio::test]
async fn classify_adds_recognized_item() {
    let mock_server = MockServer::start().await;
    let app = app_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("Peanut Butter"))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/classify")
        .header("content-type", "image/jpeg")
        .body(Body::from(vec![0xFF, 0xD8, 0xFF]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["outcome"], "added");
    assert_eq!(body["data"]["label"], "Peanut Butter");
    assert_eq!(body["data"]["snapshot"]["items"][0]["key"], "peanut butter");
}

#[tokio::test]
async fn classification_failure_is_bad_gateway() {
    let mock_server = MockServer::start().await;
    let app = app_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app, "POST", "/api/classify", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to classify image. Please try again.");
}

#[tokio::test]
async fn recipe_without_items_is_unprocessable() {
    let mock_server = MockServer::start().await;
    let app = app_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(reply("unused"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app, "POST", "/api/recipe", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Failed to generate recipe: No ingredients found in the pantry."
    );
}

#[tokio::test]
async fn recipe_returns_text_and_blocks() {
    let mock_server = MockServer::start().await;
    let app = app_with_mock(&mock_server.uri());
    send(
        &app,
        "POST",
        "/api/items",
        Some(serde_json::json!({ "name": "eggs" })),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("# Omelette\n\n- 2 eggs"))
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app, "POST", "/api/recipe", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ingredients"], serde_json::json!(["eggs"]));
    assert_eq!(body["data"]["text"], "# Omelette\n\n- 2 eggs");
    assert_eq!(body["data"]["blocks"][0]["kind"], "heading");
    assert_eq!(body["data"]["blocks"][1]["kind"], "list");
}
