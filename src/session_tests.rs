//! Tests for the action boundary.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::models::PantryItem;
use crate::store::SqliteStore;

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

fn session_without_assistant() -> PantrySession {
    PantrySession::new(Arc::new(SqliteStore::open_in_memory().unwrap()), None)
}

fn session_with_mock(mock_uri: &str) -> PantrySession {
    let api = OpenAiClient::new("test-key".to_string()).with_base_url(mock_uri);
    PantrySession::new(
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Some(Assistant::new(api)),
    )
}

// ── assistant disabled ───────────────────────────────────────────────

#[tokio::test]
async fn without_api_key_assistant_actions_are_disabled() {
    let session = session_without_assistant();
    assert!(!session.assistant_enabled());

    let photo = session.add_by_photo(b"jpeg").await;
    assert!(matches!(photo, Err(PantryError::AssistantDisabled)));

    let recipe = session.generate_recipe().await;
    assert!(matches!(recipe, Err(PantryError::AssistantDisabled)));
}

#[tokio::test]
async fn without_api_key_crud_still_works() {
    let session = session_without_assistant();

    session.add_by_name("Pasta").await.unwrap();
    session.increase_count("pasta").await.unwrap();
    let snapshot = session.decrease_count("pasta").await.unwrap();
    assert_eq!(snapshot.items, vec![PantryItem::new("pasta", 1)]);

    let snapshot = session.remove_item("pasta").await.unwrap();
    assert!(snapshot.is_empty());
}

#[test]
fn assistant_from_config_requires_key() {
    let config = Config::from_lookup(|_| None);
    assert!(Assistant::from_config(&config).is_none());

    let config = Config::from_lookup(|key| (key == "OPENAI_API_KEY").then(|| "sk".to_string()));
    assert!(Assistant::from_config(&config).is_some());
}

// ── add_by_photo ─────────────────────────────────────────────────────

#[tokio::test]
async fn photo_label_is_added_as_normalized_item() {
    let mock_server = MockServer::start().await;
    let session = session_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply("Canned Tomatoes"))
        .mount(&mock_server)
        .await;

    match session.add_by_photo(b"jpeg").await.unwrap() {
        PhotoOutcome::Added { label, snapshot } => {
            assert_eq!(label, "Canned Tomatoes");
            assert_eq!(snapshot.items, vec![PantryItem::new("canned tomatoes", 1)]);
        }
        other => panic!("Expected PhotoOutcome::Added, got: {other:?}"),
    }
    assert!(!session.is_busy());
}

#[tokio::test]
async fn rejected_photo_adds_nothing() {
    let mock_server = MockServer::start().await;
    let session = session_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(reply("Not pantry item"))
        .mount(&mock_server)
        .await;

    match session.add_by_photo(b"jpeg").await.unwrap() {
        PhotoOutcome::Rejected { message } => assert_eq!(message, REJECTED_MESSAGE),
        other => panic!("Expected PhotoOutcome::Rejected, got: {other:?}"),
    }
    assert!(session.refresh().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_classification_clears_busy_flag() {
    let mock_server = MockServer::start().await;
    let session = session_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = session.add_by_photo(b"jpeg").await;
    assert!(matches!(result, Err(PantryError::ClassificationFailed(_))));
    assert!(!session.is_busy());
    assert!(session.refresh().await.unwrap().is_empty());
}

#[tokio::test]
async fn second_request_while_busy_is_refused() {
    let mock_server = MockServer::start().await;
    let session = session_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(reply("Oats").set_delay(Duration::from_millis(200)))
        .mount(&mock_server)
        .await;

    let (first, second) = tokio::join!(
        session.add_by_photo(b"first"),
        session.add_by_photo(b"second")
    );

    assert!(matches!(first, Ok(PhotoOutcome::Added { .. })));
    assert!(matches!(second, Err(PantryError::Busy)));
    assert!(!session.is_busy());
}

// ── generate_recipe ──────────────────────────────────────────────────

#[tokio::test]
async fn recipe_on_empty_pantry_fails_without_request() {
    let mock_server = MockServer::start().await;
    let session = session_with_mock(&mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(reply("unused"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = session.generate_recipe().await;
    assert!(matches!(result, Err(PantryError::NoIngredients)));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn recipe_uses_every_stored_item() {
    let mock_server = MockServer::start().await;
    let session = session_with_mock(&mock_server.uri());
    session.add_by_name("Rice").await.unwrap();
    session.add_by_name("Beans").await.unwrap();
    session.set_search_filter("ri");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("these ingredients: beans, rice."))
        .respond_with(reply("## Beans and Rice\n\n1. Cook.\n2. Eat."))
        .expect(1)
        .mount(&mock_server)
        .await;

    let recipe = session.generate_recipe().await.unwrap();
    assert_eq!(recipe.ingredients, vec!["beans", "rice"]);
    assert_eq!(recipe.text, "## Beans and Rice\n\n1. Cook.\n2. Eat.");
    assert_eq!(
        recipe.blocks,
        vec![
            RecipeBlock::Heading {
                level: 2,
                text: "Beans and Rice".to_string()
            },
            RecipeBlock::List {
                start: Some(1),
                items: vec!["Cook.".to_string(), "Eat.".to_string()]
            },
        ]
    );
}

#[test]
fn photo_outcome_serializes_with_outcome_tag() {
    let json = serde_json::to_value(PhotoOutcome::Rejected {
        message: REJECTED_MESSAGE,
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "outcome": "rejected", "message": "Please try with a pantry item." })
    );
}
