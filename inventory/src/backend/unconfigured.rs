//! Stand-in used when the Firebase configuration cannot be loaded.
//!
//! Reports a signed-out user so the client tries to sign in, then fails
//! every sign-in with [`InventoryError::Init`]. Nothing is ever stored.

use crate::environment::{AuthProvider, InventoryStore};
use crate::error::InventoryError;
use crate::types::{CollectionPath, Item, ItemId, NewItem, UserId};
use futures::{Stream, stream};
use std::future::{Future, ready};

/// Backend for a client whose configuration is missing or invalid
#[derive(Clone, Debug)]
pub struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    /// Records why the real backend could not be built
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> InventoryError {
        InventoryError::Init(self.reason.clone())
    }
}

impl AuthProvider for Unconfigured {
    fn auth_state(&self) -> impl Stream<Item = Option<UserId>> + Send {
        stream::iter([None])
    }

    fn sign_in_anonymously(&self) -> impl Future<Output = Result<UserId, InventoryError>> + Send {
        ready(Err(self.error()))
    }

    fn sign_in_with_custom_token(
        &self,
        _token: &str,
    ) -> impl Future<Output = Result<UserId, InventoryError>> + Send {
        ready(Err(self.error()))
    }
}

impl InventoryStore for Unconfigured {
    fn subscribe(
        &self,
        _path: &CollectionPath,
    ) -> impl Stream<Item = Result<Vec<Item>, InventoryError>> + Send {
        stream::iter([Err(self.error())])
    }

    fn create(
        &self,
        _path: &CollectionPath,
        _item: NewItem,
    ) -> impl Future<Output = Result<ItemId, InventoryError>> + Send {
        ready(Err(self.error()))
    }

    fn delete(
        &self,
        _path: &CollectionPath,
        _id: &ItemId,
    ) -> impl Future<Output = Result<(), InventoryError>> + Send {
        ready(Err(self.error()))
    }
}
