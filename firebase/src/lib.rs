//! # Larder Firebase
//!
//! Rust client for the two Firebase services the Larder client talks to:
//! the Identity Toolkit (anonymous and custom-token sign-in, token refresh)
//! and the Cloud Firestore v1 REST API (documents, commits, listing).
//!
//! ## Example
//!
//! ```no_run
//! use larder_firebase::{FirebaseOptions, FirestoreClient, IdentityClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = FirebaseOptions::from_json(
//!         r#"{"apiKey":"AIza...","projectId":"demo-larder"}"#,
//!     )?;
//!
//!     let identity = IdentityClient::new(&options);
//!     let session = identity.sign_up_anonymous().await?;
//!
//!     let firestore = FirestoreClient::new(&options);
//!     let docs = firestore
//!         .list_documents(&session.id_token, "artifacts/app/users/u/refrigerator_inventory")
//!         .await?;
//!
//!     println!("{} documents", docs.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Anonymous and custom-token sign-in with account lookup
//! - ID token refresh through the secure token service
//! - Document create (with server timestamps), delete and paged listing
//! - A polling listen stream that re-lists immediately after local writes
//! - Overridable base URLs for the local emulator suite

pub mod error;
pub mod firestore;
pub mod identity;
pub mod options;
pub mod value;

// Re-export main types for convenience
pub use error::FirebaseError;
pub use firestore::{Document, FirestoreClient, auto_id};
pub use identity::{AuthSession, IdentityClient};
pub use options::FirebaseOptions;
pub use value::Value;
