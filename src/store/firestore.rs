//! Firestore pantry store over the REST `documents` API
//!
//! Each pantry item is a document `{collection}/{key}` with a single integer
//! field `count`. Counter updates use the trait's read-then-write default.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{clamp_count, ItemDocument, PantryStore};
use crate::error::{PantryError, Result};
use crate::models::PantryItem;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

/// Firestore typed value; only the integer variant is used for `count`
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    integer_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    double_value: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FirestoreDocument {
    #[serde(default, skip_serializing)]
    name: String,
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl FirestoreDocument {
    fn from_count(count: u32) -> Self {
        let mut fields = HashMap::new();
        fields.insert(
            "count".to_string(),
            FirestoreValue {
                integer_value: Some(count.to_string()),
                double_value: None,
            },
        );
        Self {
            name: String::new(),
            fields,
        }
    }

    /// Last path segment of the resource name
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn count(&self) -> Option<u32> {
        let value = self.fields.get("count")?;
        let count = match (&value.integer_value, value.double_value) {
            (Some(int), _) => int.parse::<i64>().ok()?,
            (None, Some(double)) if double.fract() == 0.0 => double as i64,
            _ => return None,
        };
        (count >= 1).then(|| clamp_count(count))
    }
}

/// Pantry store backed by a Firestore collection
pub struct FirestoreStore {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) project_id: String,
    pub(crate) collection: String,
    pub(crate) api_key: Option<String>,
}

impl FirestoreStore {
    /// Creates a store for `collection` in the project's default database.
    pub fn new(project_id: String, collection: String, api_key: Option<String>) -> Self {
        log::info!(
            "Creating Firestore store for project {} (collection: {})",
            project_id,
            collection
        );
        Self {
            client: Client::new(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id,
            collection,
            api_key,
        }
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url,
            self.project_id,
            urlencoding::encode(&self.collection)
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(id))
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::error!("Firestore {} failed with status {}: {}", action, status, body);
        Err(PantryError::store(format!(
            "Firestore {} failed: HTTP {}",
            action, status
        )))
    }
}

#[async_trait]
impl PantryStore for FirestoreStore {
    async fn get(&self, id: &str) -> Result<Option<ItemDocument>> {
        log::debug!("Firestore get: {}", id);
        let response = self
            .with_key(self.client.get(self.document_url(id)))
            .send()
            .await
            .map_err(PantryError::store)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: FirestoreDocument = Self::check(response, "get")
            .await?
            .json()
            .await
            .map_err(PantryError::store)?;

        match document.count() {
            Some(count) => Ok(Some(ItemDocument { count })),
            None => Err(PantryError::store(format!(
                "document {} has no valid count field",
                id
            ))),
        }
    }

    async fn set(&self, id: &str, doc: ItemDocument) -> Result<()> {
        if doc.count == 0 {
            return self.delete(id).await;
        }
        log::debug!("Firestore set: {} = {}", id, doc.count);
        let response = self
            .with_key(self.client.patch(self.document_url(id)))
            .json(&FirestoreDocument::from_count(doc.count))
            .send()
            .await
            .map_err(PantryError::store)?;
        Self::check(response, "set").await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        log::debug!("Firestore delete: {}", id);
        let response = self
            .with_key(self.client.delete(self.document_url(id)))
            .send()
            .await
            .map_err(PantryError::store)?;

        // Deleting a document that does not exist is not an error
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response, "delete").await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PantryItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .with_key(self.client.get(self.collection_url()))
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(PantryError::store)?;
            let page: ListDocumentsResponse = Self::check(response, "list")
                .await?
                .json()
                .await
                .map_err(PantryError::store)?;

            for document in &page.documents {
                match document.count() {
                    Some(count) => items.push(PantryItem::new(document.id(), count)),
                    None => log::warn!(
                        "Skipping document without a valid count: {}",
                        document.name
                    ),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        log::debug!("Firestore list: {} documents", items.len());
        Ok(items)
    }
}

#[cfg(test)]
#[path = "firestore_tests.rs"]
mod tests;
