//! Collaborators injected into the inventory reducer.
//!
//! The reducer never talks to the network itself: it asks these traits for
//! futures and streams and wraps them in effects.

use crate::config::AppConfig;
use crate::error::InventoryError;
use crate::types::{CollectionPath, Item, ItemId, NewItem, UserId};
use futures::Stream;
use std::future::Future;
use std::time::Duration;

/// Authentication service
pub trait AuthProvider: Send + Sync + Clone + 'static {
    /// Current user, then every change (`None` when signed out)
    fn auth_state(&self) -> impl Stream<Item = Option<UserId>> + Send;

    /// Sign in as a fresh anonymous user
    fn sign_in_anonymously(&self) -> impl Future<Output = Result<UserId, InventoryError>> + Send;

    /// Sign in with a custom token minted by a trusted server
    fn sign_in_with_custom_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserId, InventoryError>> + Send;
}

/// Real-time document store holding the inventory collections
pub trait InventoryStore: Send + Sync + Clone + 'static {
    /// Full snapshots of the collection, pushed on every change
    ///
    /// An `Err` item means the subscription is dead; nothing follows it.
    fn subscribe(
        &self,
        path: &CollectionPath,
    ) -> impl Stream<Item = Result<Vec<Item>, InventoryError>> + Send;

    /// Create an item stamped with the server's clock
    fn create(
        &self,
        path: &CollectionPath,
        item: NewItem,
    ) -> impl Future<Output = Result<ItemId, InventoryError>> + Send;

    /// Delete an item
    fn delete(
        &self,
        path: &CollectionPath,
        id: &ItemId,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send;
}

/// Environment for the inventory reducer
#[derive(Clone, Debug)]
pub struct InventoryEnvironment<A, S> {
    /// Authentication service
    pub auth: A,
    /// Document store
    pub store: S,
    /// Namespace segment of collection paths
    pub app_id: String,
    /// Custom token to sign in with, if any
    pub initial_auth_token: Option<String>,
    /// Lifetime of transient feedback
    pub feedback_ttl: Duration,
}

impl<A: AuthProvider, S: InventoryStore> InventoryEnvironment<A, S> {
    /// Creates an environment from collaborators and configuration
    #[must_use]
    pub fn new(auth: A, store: S, config: &AppConfig) -> Self {
        Self {
            auth,
            store,
            app_id: config.app_id.clone(),
            initial_auth_token: config.initial_auth_token.clone(),
            feedback_ttl: config.feedback_ttl,
        }
    }

    /// Collection holding `user_id`'s items
    #[must_use]
    pub fn collection(&self, user_id: &UserId) -> CollectionPath {
        CollectionPath::for_user(&self.app_id, user_id)
    }
}
