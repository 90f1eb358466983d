//! # Larder Inventory
//!
//! A personal refrigerator inventory built on the Larder reducer architecture.
//!
//! ## Architecture
//!
//! - **State**: [`InventoryState`] holds the session, the latest snapshot,
//!   the add-item form and the feedback banner
//! - **Action**: [`InventoryAction`] covers user input and every collaborator
//!   result
//! - **Reducer**: [`InventoryReducer`] is the only place state changes
//! - **Environment**: [`InventoryEnvironment`] injects an [`AuthProvider`]
//!   and an [`InventoryStore`]
//! - **View**: [`render_model`] projects state onto the screen
//!
//! ## Example
//!
//! ```no_run
//! use larder_inventory::{
//!     AppConfig, InMemoryFirebase, InventoryAction, InventoryEnvironment, InventoryReducer,
//!     InventoryState,
//! };
//! use larder_runtime::Store;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemoryFirebase::new();
//! let env = InventoryEnvironment::new(backend.clone(), backend, &AppConfig::default());
//! let reducer = InventoryReducer::<InMemoryFirebase, InMemoryFirebase>::new();
//! let store = Store::new(InventoryState::new(), reducer, env);
//!
//! store.send(InventoryAction::Bootstrap).await?;
//! store
//!     .send(InventoryAction::AddItem { name: "Milk".into(), quantity: 2 })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod reducer;
pub mod types;
pub mod view;

pub use backend::{FirebaseBackend, InMemoryFirebase, Unconfigured};
pub use command::{Command, CommandError};
pub use config::{AppConfig, BackendKind};
pub use environment::{AuthProvider, InventoryEnvironment, InventoryStore};
pub use error::{InventoryError, MutationOp, ValidationError};
pub use reducer::InventoryReducer;
pub use types::{
    CollectionPath, Feedback, FeedbackKind, InventoryAction, InventoryState, Item, ItemId, NewItem,
    Phase, Session, UserId, sort_newest_first,
};
pub use view::{ViewModel, render_model};
