//! Implementations of the collaborator traits.
//!
//! - [`InMemoryFirebase`]: in-process, for local runs and tests
//! - [`FirebaseBackend`]: Firebase Auth and Cloud Firestore over REST
//! - [`Unconfigured`]: fails sign-in when no usable configuration exists

mod firebase;
mod memory;
mod unconfigured;

pub use firebase::FirebaseBackend;
pub use memory::InMemoryFirebase;
pub use unconfigured::Unconfigured;
