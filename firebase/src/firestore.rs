//! Cloud Firestore v1 REST client

use crate::{
    error::{FirebaseError, check_status, parse_failed, request_failed},
    options::FirebaseOptions,
    value::Value,
};
use async_stream::stream;
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use rand::{Rng, distributions::Alphanumeric};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;
const AUTO_ID_LEN: usize = 20;
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Generate a document ID the way the client SDKs do: 20 characters from `[A-Za-z0-9]`
#[must_use]
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{path}`
    pub name: String,
    /// Field values
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// When the document was created
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    /// When the document was last changed
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The document ID (last segment of the resource name)
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Look up a field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Firestore REST API client
///
/// Clones share a write counter, so a [`FirestoreClient::listen`] stream
/// notices writes made through any clone of the same client.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    api_url: String,
    database: String,
    writes: Arc<watch::Sender<u64>>,
}

impl FirestoreClient {
    /// Create a client for the project's database
    #[must_use]
    pub fn new(options: &FirebaseOptions) -> Self {
        let (writes, _) = watch::channel(0);
        Self {
            client: Client::new(),
            api_url: FIRESTORE_URL.to_string(),
            database: options.database_name(),
            writes: Arc::new(writes),
        }
    }

    /// Point the client at another host (the Firestore emulator, a mock server)
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Resource name of a document
    #[must_use]
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}/documents/{collection}", self.api_url, self.database)
    }

    /// Create a document with a fresh auto-ID
    ///
    /// The write fails if the ID is already taken. When
    /// `server_timestamp_field` is set, that field is filled in by the server
    /// with the commit time.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, rejected credentials, or API errors
    #[tracing::instrument(skip(self, id_token, fields))]
    pub async fn create_document(
        &self,
        id_token: &str,
        collection: &str,
        fields: BTreeMap<String, Value>,
        server_timestamp_field: Option<&str>,
    ) -> Result<String, FirebaseError> {
        let id = auto_id();

        let mut write = json!({
            "update": {
                "name": self.document_name(collection, &id),
                "fields": fields,
            },
            "currentDocument": { "exists": false },
        });
        if let Some(field) = server_timestamp_field {
            write["updateTransforms"] = json!([
                { "fieldPath": field, "setToServerValue": "REQUEST_TIME" }
            ]);
        }

        let response = self
            .client
            .post(format!("{}/{}/documents:commit", self.api_url, self.database))
            .bearer_auth(id_token)
            .json(&json!({ "writes": [write] }))
            .send()
            .await
            .map_err(|e| request_failed(&e))?;
        check_status(response).await?;

        self.writes.send_modify(|n| *n += 1);
        tracing::debug!(%id, "Document created");
        Ok(id)
    }

    /// Delete a document
    ///
    /// Deleting a document that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, rejected credentials, or API errors
    #[tracing::instrument(skip(self, id_token))]
    pub async fn delete_document(
        &self,
        id_token: &str,
        collection: &str,
        id: &str,
    ) -> Result<(), FirebaseError> {
        let response = self
            .client
            .delete(format!("{}/{id}", self.collection_url(collection)))
            .bearer_auth(id_token)
            .send()
            .await
            .map_err(|e| request_failed(&e))?;
        check_status(response).await?;

        self.writes.send_modify(|n| *n += 1);
        tracing::debug!(%id, "Document deleted");
        Ok(())
    }

    /// List every document in a collection, following page tokens
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, rejected credentials, or parsing failures
    pub async fn list_documents(
        &self,
        id_token: &str,
        collection: &str,
    ) -> Result<Vec<Document>, FirebaseError> {
        let url = self.collection_url(collection);
        let page_size = PAGE_SIZE.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(id_token)
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(|e| request_failed(&e))?;
            let page: ListResponse = check_status(response)
                .await?
                .json()
                .await
                .map_err(|e| parse_failed(&e))?;

            documents.extend(page.documents);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Watch a collection
    ///
    /// The REST API has no push channel, so the collection is re-listed every
    /// `interval` and after every write made through this client. The first
    /// snapshot is always yielded; later ones only when the documents changed.
    /// `id_token` is asked for a token before every listing so long-running
    /// streams survive token refreshes.
    ///
    /// The stream ends after yielding its first error.
    pub fn listen<T, Fut>(
        &self,
        collection: impl Into<String>,
        interval: Duration,
        id_token: T,
    ) -> impl Stream<Item = Result<Vec<Document>, FirebaseError>> + Send + 'static
    where
        T: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, FirebaseError>> + Send,
    {
        let client = self.clone();
        let collection = collection.into();
        let mut writes = self.writes.subscribe();

        stream! {
            let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<Document>> = None;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {},
                    changed = writes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        ticker.reset();
                    },
                }

                let listed = match id_token().await {
                    Ok(token) => client.list_documents(&token, &collection).await,
                    Err(e) => Err(e),
                };

                match listed {
                    Ok(documents) => {
                        if last.as_ref() != Some(&documents) {
                            last = Some(documents.clone());
                            yield Ok(documents);
                        }
                    },
                    Err(e) => {
                        tracing::warn!(%collection, error = %e, "Listing failed, closing listener");
                        yield Err(e);
                        break;
                    },
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn auto_ids_are_twenty_alphanumerics() {
        let id = auto_id();
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(auto_id(), id);
    }

    #[test]
    fn document_names_are_database_scoped() {
        let client = FirestoreClient::new(&FirebaseOptions::new("k", "demo"));
        assert_eq!(
            client.document_name("artifacts/app/users/u1/refrigerator_inventory", "abc"),
            "projects/demo/databases/(default)/documents/artifacts/app/users/u1/refrigerator_inventory/abc"
        );
    }

    #[test]
    fn document_id_is_last_segment() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/items/xyz",
            "fields": { "name": { "stringValue": "Milk" } },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.id(), "xyz");
        assert_eq!(doc.field("name").and_then(Value::as_str), Some("Milk"));
    }
}
