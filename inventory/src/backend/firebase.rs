//! Firebase Auth and Cloud Firestore behind the collaborator traits.
//!
//! Documents carry three fields: `name` (string), `quantity` (integer) and
//! `timestamp`, which the server fills in with the commit time.

use crate::environment::{AuthProvider, InventoryStore};
use crate::error::{InventoryError, MutationOp};
use crate::types::{CollectionPath, Item, ItemId, NewItem, UserId};
use chrono::Utc;
use futures::{Stream, StreamExt};
use larder_firebase::{
    AuthSession, Document, FirebaseError, FirebaseOptions, FirestoreClient, IdentityClient, Value,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

const NAME_FIELD: &str = "name";
const QUANTITY_FIELD: &str = "quantity";
const TIMESTAMP_FIELD: &str = "timestamp";

/// Tokens closer than this to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

/// REST-backed auth service and document store
#[derive(Clone)]
pub struct FirebaseBackend {
    identity: IdentityClient,
    firestore: FirestoreClient,
    session: Arc<RwLock<Option<AuthSession>>>,
    auth_state: Arc<watch::Sender<Option<UserId>>>,
    poll_interval: Duration,
}

impl std::fmt::Debug for FirebaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseBackend")
            .field("user", &*self.auth_state.borrow())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl FirebaseBackend {
    /// Creates a backend talking to the production endpoints
    #[must_use]
    pub fn new(options: &FirebaseOptions, poll_interval: Duration) -> Self {
        Self::with_clients(
            IdentityClient::new(options),
            FirestoreClient::new(options),
            poll_interval,
        )
    }

    /// Creates a backend from preconfigured clients (emulators, mock servers)
    #[must_use]
    pub fn with_clients(
        identity: IdentityClient,
        firestore: FirestoreClient,
        poll_interval: Duration,
    ) -> Self {
        let (auth_state, _) = watch::channel(None);
        Self {
            identity,
            firestore,
            session: Arc::new(RwLock::new(None)),
            auth_state: Arc::new(auth_state),
            poll_interval,
        }
    }

    async fn store_session(&self, session: AuthSession) -> UserId {
        let user_id = UserId::new(session.local_id.clone());
        *self.session.write().await = Some(session);
        self.auth_state.send_replace(Some(user_id.clone()));
        tracing::info!(%user_id, "Signed in");
        user_id
    }

    /// A current ID token, refreshed first when close to expiry
    async fn id_token(&self) -> Result<String, FirebaseError> {
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Err(FirebaseError::Unauthorized);
        };

        if !session.expires_within(Utc::now(), chrono::Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(session.id_token);
        }

        tracing::debug!("Refreshing ID token");
        let refreshed = self.identity.refresh(&session.refresh_token).await?;
        let token = refreshed.id_token.clone();
        *self.session.write().await = Some(refreshed);
        Ok(token)
    }
}

/// Maps a stored document onto an item; `None` when a field is missing or
/// mistyped, the name is blank or the quantity is below 1
fn to_item(document: &Document) -> Option<Item> {
    let name = document
        .field(NAME_FIELD)?
        .as_str()
        .filter(|name| !name.trim().is_empty())?
        .to_string();
    let quantity = document
        .field(QUANTITY_FIELD)?
        .as_i64()
        .filter(|quantity| *quantity >= 1)?;
    let created_at = document.field(TIMESTAMP_FIELD).and_then(Value::as_timestamp);

    Some(Item {
        id: ItemId::new(document.id()),
        name,
        quantity,
        created_at,
    })
}

fn to_items(documents: &[Document]) -> Vec<Item> {
    documents
        .iter()
        .filter_map(|document| {
            let item = to_item(document);
            if item.is_none() {
                tracing::warn!(document = %document.name, "Skipping malformed document");
            }
            item
        })
        .collect()
}

impl AuthProvider for FirebaseBackend {
    fn auth_state(&self) -> impl Stream<Item = Option<UserId>> + Send {
        let mut changes = self.auth_state.subscribe();
        async_stream::stream! {
            loop {
                let user = changes.borrow_and_update().clone();
                yield user;
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    fn sign_in_anonymously(&self) -> impl Future<Output = Result<UserId, InventoryError>> + Send {
        let backend = self.clone();
        async move {
            let session = backend.identity.sign_up_anonymous().await?;
            Ok(backend.store_session(session).await)
        }
    }

    fn sign_in_with_custom_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserId, InventoryError>> + Send {
        let backend = self.clone();
        let token = token.to_string();
        async move {
            let session = backend.identity.sign_in_with_custom_token(&token).await?;
            Ok(backend.store_session(session).await)
        }
    }
}

impl InventoryStore for FirebaseBackend {
    fn subscribe(
        &self,
        path: &CollectionPath,
    ) -> impl Stream<Item = Result<Vec<Item>, InventoryError>> + Send {
        let backend = self.clone();
        self.firestore
            .listen(path.as_str(), self.poll_interval, move || {
                let backend = backend.clone();
                async move { backend.id_token().await }
            })
            .map(|listed| {
                listed
                    .map(|documents| to_items(&documents))
                    .map_err(|e| InventoryError::Subscription(e.to_string()))
            })
    }

    fn create(
        &self,
        path: &CollectionPath,
        item: NewItem,
    ) -> impl Future<Output = Result<ItemId, InventoryError>> + Send {
        let backend = self.clone();
        let path = path.clone();
        async move {
            let fields = BTreeMap::from([
                (NAME_FIELD.to_string(), Value::from(item.name())),
                (QUANTITY_FIELD.to_string(), Value::from(item.quantity())),
            ]);
            let token = backend
                .id_token()
                .await
                .map_err(|e| InventoryError::mutation(MutationOp::Add, e))?;
            let id = backend
                .firestore
                .create_document(&token, path.as_str(), fields, Some(TIMESTAMP_FIELD))
                .await
                .map_err(|e| InventoryError::mutation(MutationOp::Add, e))?;
            Ok(ItemId::new(id))
        }
    }

    fn delete(
        &self,
        path: &CollectionPath,
        id: &ItemId,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send {
        let backend = self.clone();
        let path = path.clone();
        let id = id.clone();
        async move {
            let token = backend
                .id_token()
                .await
                .map_err(|e| InventoryError::mutation(MutationOp::Remove, e))?;
            backend
                .firestore
                .delete_document(&token, path.as_str(), id.as_str())
                .await
                .map_err(|e| InventoryError::mutation(MutationOp::Remove, e))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn document(fields: Vec<(&str, Value)>) -> Document {
        Document {
            name: "projects/p/databases/(default)/documents/items/abc".to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            create_time: None,
            update_time: None,
        }
    }

    #[test]
    fn maps_complete_documents() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let item = to_item(&document(vec![
            (NAME_FIELD, Value::from("Milk")),
            (QUANTITY_FIELD, Value::from(2)),
            (TIMESTAMP_FIELD, Value::from(ts)),
        ]))
        .unwrap();

        assert_eq!(item.id.as_str(), "abc");
        assert_eq!(item.name, "Milk");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.created_at, Some(ts));
    }

    #[test]
    fn missing_timestamp_is_pending() {
        let item = to_item(&document(vec![
            (NAME_FIELD, Value::from("Eggs")),
            (QUANTITY_FIELD, Value::DoubleValue(12.0)),
        ]))
        .unwrap();
        assert_eq!(item.quantity, 12);
        assert_eq!(item.created_at, None);
    }

    #[test]
    fn malformed_documents_are_skipped() {
        let documents = vec![
            document(vec![(NAME_FIELD, Value::from("No quantity"))]),
            document(vec![
                (NAME_FIELD, Value::from(3)),
                (QUANTITY_FIELD, Value::from(1)),
            ]),
            document(vec![
                (NAME_FIELD, Value::from("Butter")),
                (QUANTITY_FIELD, Value::from(1)),
            ]),
        ];

        let items = to_items(&documents);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Butter");
    }

    #[test]
    fn blank_names_and_non_positive_quantities_are_skipped() {
        let documents = vec![
            document(vec![
                (NAME_FIELD, Value::from("")),
                (QUANTITY_FIELD, Value::from(1)),
            ]),
            document(vec![
                (NAME_FIELD, Value::from("   ")),
                (QUANTITY_FIELD, Value::from(2)),
            ]),
            document(vec![
                (NAME_FIELD, Value::from("Cheese")),
                (QUANTITY_FIELD, Value::from(0)),
            ]),
            document(vec![
                (NAME_FIELD, Value::from("Jam")),
                (QUANTITY_FIELD, Value::from(-3)),
            ]),
            document(vec![
                (NAME_FIELD, Value::from("Yogurt")),
                (QUANTITY_FIELD, Value::from(1)),
            ]),
        ];

        let items = to_items(&documents);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Yogurt");
        assert_eq!(items[0].quantity, 1);
    }
}
