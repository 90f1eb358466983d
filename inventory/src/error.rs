//! Error taxonomy for the inventory client.
//!
//! No error is fatal: effects turn failures into actions and the reducer
//! turns those into the banner text from [`InventoryError::user_message`].

use larder_firebase::FirebaseError;
use thiserror::Error;

/// Local input that cannot become an item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The name is empty after trimming
    #[error("item name is empty")]
    EmptyName,

    /// The quantity is zero or negative
    #[error("quantity must be at least 1, got {0}")]
    QuantityBelowOne(i64),
}

/// Which mutation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    /// Creating an item
    Add,
    /// Deleting an item
    Remove,
}

impl std::fmt::Display for MutationOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// Errors surfaced by the inventory client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The auth service rejected sign-in
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The collaborators are misconfigured
    #[error("initialization failed: {0}")]
    Init(String),

    /// The live subscription failed
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// Bad local input
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// No ready session yet
    #[error("session not ready")]
    NotReady,

    /// The store rejected a create or delete
    #[error("{op} failed: {reason}")]
    Mutation {
        /// Which mutation
        op: MutationOp,
        /// Store-provided reason
        reason: String,
    },
}

impl InventoryError {
    /// A rejected create or delete
    #[must_use]
    pub fn mutation(op: MutationOp, reason: impl std::fmt::Display) -> Self {
        Self::Mutation {
            op,
            reason: reason.to_string(),
        }
    }

    /// Banner text for this error
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Auth(_) => "Authentication failed. Please try again later.",
            Self::Init(_) => "Failed to initialize the app. Please check console for details.",
            Self::Subscription(_) => "Failed to load inventory. Please refresh.",
            Self::Validation(_) => "Please enter a valid item name and quantity.",
            Self::NotReady => "App not ready. Please wait for authentication.",
            Self::Mutation {
                op: MutationOp::Add,
                ..
            } => "Failed to add item. Please try again.",
            Self::Mutation {
                op: MutationOp::Remove,
                ..
            } => "Failed to remove item. Please try again.",
        }
    }
}

/// Vendor errors on the auth path
///
/// Store operations attach their own context with
/// [`InventoryError::mutation`] or [`InventoryError::Subscription`].
impl From<FirebaseError> for InventoryError {
    fn from(error: FirebaseError) -> Self {
        match error {
            FirebaseError::MissingOption(_) => Self::Init(error.to_string()),
            other => Self::Auth(other.to_string()),
        }
    }
}
