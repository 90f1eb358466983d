//! Domain types for the refrigerator inventory.
//!
//! Items live in a per-user collection of the document store. The client
//! never edits an item in place: it creates, deletes and re-renders whatever
//! snapshot the store pushes.

use crate::error::{InventoryError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identifier of a stored item, assigned by the document store
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Wraps a store-assigned identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an authenticated user
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wraps an identifier resolved by the auth service
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored inventory item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// How many are in the fridge
    pub quantity: i64,
    /// Server-assigned creation time; `None` while the write is pending
    pub created_at: Option<DateTime<Utc>>,
}

/// Validated input for a new item
///
/// Only [`NewItem::parse`] builds one, so holding a `NewItem` means the name
/// is non-empty after trimming and the quantity is at least 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    name: String,
    quantity: i64,
}

impl NewItem {
    /// Validates raw form input
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for a blank name and
    /// [`ValidationError::QuantityBelowOne`] for a quantity under 1.
    pub fn parse(name: &str, quantity: i64) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if quantity < 1 {
            return Err(ValidationError::QuantityBelowOne(quantity));
        }

        Ok(Self {
            name: name.to_string(),
            quantity,
        })
    }

    /// Trimmed item name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quantity, at least 1
    #[must_use]
    pub const fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// Authentication state of the client
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// The signed-in user, once the auth service has resolved one
    pub user_id: Option<UserId>,
    /// Whether mutations and the subscription may run
    pub ready: bool,
}

impl Session {
    /// A ready session for `user_id`
    #[must_use]
    pub const fn ready(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ready: true,
        }
    }

    /// The user, but only when the session is ready
    #[must_use]
    pub fn ready_user(&self) -> Option<&UserId> {
        self.user_id.as_ref().filter(|_| self.ready)
    }
}

/// Location of a user's inventory collection
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// `artifacts/{app_id}/users/{user_id}/refrigerator_inventory`
    #[must_use]
    pub fn for_user(app_id: &str, user_id: &UserId) -> Self {
        Self(format!(
            "artifacts/{app_id}/users/{user_id}/refrigerator_inventory"
        ))
    }

    /// Returns the path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tone of a feedback message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackKind {
    /// An operation went through
    Success,
    /// Something failed or was rejected
    Error,
}

/// The message banner shown above the inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    /// User-facing text
    pub message: String,
    /// Tone
    pub kind: FeedbackKind,
    /// Identifies this message to its clear timer
    pub generation: u64,
    /// Whether the message clears itself
    pub transient: bool,
}

/// The add-item form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddItemForm {
    /// Name field contents
    pub name: String,
    /// Quantity field value
    pub quantity: i64,
}

impl Default for AddItemForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            quantity: 1,
        }
    }
}

impl AddItemForm {
    /// Sets the quantity from text the way a numeric input does:
    /// unparseable text counts as 1 and anything below 1 becomes 1
    pub fn set_quantity_text(&mut self, text: &str) {
        self.quantity = text.trim().parse::<i64>().unwrap_or(1).max(1);
    }
}

/// Screen phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a session
    #[default]
    Loading,
    /// A user is signed in and the inventory is live
    Active,
}

/// Complete client state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventoryState {
    /// Screen phase
    pub phase: Phase,
    /// Authentication state
    pub session: Session,
    /// Latest snapshot for the session's user, newest first
    pub items: Vec<Item>,
    /// Add-item form
    pub form: AddItemForm,
    /// Current banner
    pub feedback: Option<Feedback>,
    /// A sign-in request is in flight
    pub signing_in: bool,
    /// The auth-state listener is running
    pub auth_listening: bool,
    /// Generation the next feedback message gets
    pub next_generation: u64,
}

impl InventoryState {
    /// Creates the initial state: loading, no session, empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Every input the inventory reducer handles
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InventoryAction {
    // ========== Session ==========
    /// Start listening for auth state changes
    Bootstrap,
    /// The auth service reported the current user (or none)
    AuthStateChanged(Option<UserId>),
    /// A sign-in request resolved a user
    SignInSucceeded(UserId),
    /// A sign-in request was rejected
    SignInFailed(InventoryError),
    /// Issue the sign-in again after a failure
    RetrySignIn,
    /// The collaborators could not be initialized
    InitFailed(InventoryError),

    // ========== Subscription ==========
    /// A full snapshot of a user's collection
    SnapshotReceived {
        /// Whose collection the snapshot belongs to
        user_id: UserId,
        /// Items in store order
        items: Vec<Item>,
    },
    /// The live subscription failed
    SubscriptionFailed {
        /// Whose subscription failed
        user_id: UserId,
        /// What went wrong
        error: InventoryError,
    },
    /// Restart the subscription for the current user
    Refresh,

    // ========== Mutations ==========
    /// Create an item
    AddItem {
        /// Raw name input
        name: String,
        /// Raw quantity input
        quantity: i64,
    },
    /// Create an item from the form fields
    SubmitForm,
    /// The store created an item
    ItemAdded {
        /// Identifier of the new item
        id: ItemId,
    },
    /// The store rejected a create
    AddFailed {
        /// What went wrong
        error: InventoryError,
    },
    /// Delete an item
    DeleteItem {
        /// Item to delete
        id: ItemId,
    },
    /// The store deleted an item
    ItemDeleted {
        /// Deleted item
        id: ItemId,
    },
    /// The store rejected a delete
    DeleteFailed {
        /// Item that was not deleted
        id: ItemId,
        /// What went wrong
        error: InventoryError,
    },

    // ========== Form ==========
    /// Edit the name field
    SetName(String),
    /// Set the quantity field
    SetQuantity(i64),
    /// Edit the quantity field as text (clamped to at least 1)
    SetQuantityText(String),

    // ========== Feedback ==========
    /// Clear the banner if it is still the given generation
    ClearFeedback {
        /// Generation the timer was started for
        generation: u64,
    },
    /// Clear the banner now
    DismissFeedback,

    /// Stop every long-lived effect
    Teardown,
}

/// Orders a snapshot newest first
///
/// Items whose server timestamp is still pending sort after every
/// timestamped item. Ties are broken by ascending id so the order is stable
/// across snapshots.
pub fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(compare_newest_first);
}

fn compare_newest_first(a: &Item, b: &Item) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, secs: Option<i64>) -> Item {
        Item {
            id: ItemId::new(id),
            name: id.to_uppercase(),
            quantity: 1,
            created_at: secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        }
    }

    #[test]
    fn new_item_trims_and_validates() {
        let valid = NewItem::parse("  Milk ", 2).unwrap();
        assert_eq!(valid.name(), "Milk");
        assert_eq!(valid.quantity(), 2);

        assert_eq!(NewItem::parse("   ", 1), Err(ValidationError::EmptyName));
        assert_eq!(
            NewItem::parse("Eggs", -1),
            Err(ValidationError::QuantityBelowOne(-1))
        );
        assert_eq!(
            NewItem::parse("Eggs", 0),
            Err(ValidationError::QuantityBelowOne(0))
        );
    }

    #[test]
    fn quantity_text_clamps_to_one() {
        let mut form = AddItemForm::default();
        assert_eq!(form.quantity, 1);

        form.set_quantity_text("5");
        assert_eq!(form.quantity, 5);
        form.set_quantity_text("0");
        assert_eq!(form.quantity, 1);
        form.set_quantity_text("-3");
        assert_eq!(form.quantity, 1);
        form.set_quantity_text("lots");
        assert_eq!(form.quantity, 1);
        form.set_quantity_text("");
        assert_eq!(form.quantity, 1);
    }

    #[test]
    fn collection_path_is_scoped_per_user() {
        let path = CollectionPath::for_user("my-app", &UserId::new("u1"));
        assert_eq!(
            path.as_str(),
            "artifacts/my-app/users/u1/refrigerator_inventory"
        );
    }

    #[test]
    fn ready_user_requires_ready_flag() {
        let pending = Session {
            user_id: Some(UserId::new("u1")),
            ready: false,
        };
        assert_eq!(pending.ready_user(), None);
        assert_eq!(
            Session::ready(UserId::new("u1")).ready_user(),
            Some(&UserId::new("u1"))
        );
    }

    #[test]
    fn sorts_newest_first_with_pending_last() {
        let mut items = vec![
            item("a", Some(100)),
            item("pending", None),
            item("c", Some(300)),
            item("b", Some(200)),
        ];
        sort_newest_first(&mut items);

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a", "pending"]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_id() {
        let mut items = vec![item("z", Some(5)), item("m", Some(5)), item("y", None), item("x", None)];
        sort_newest_first(&mut items);

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["m", "z", "x", "y"]);
    }
}
