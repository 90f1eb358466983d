//! Configuration management for the inventory client.
//!
//! Loads configuration from environment variables (and a `.env` file) with
//! sensible defaults.

use crate::error::InventoryError;
use larder_firebase::FirebaseOptions;
use std::env;
use std::time::Duration;

/// Which collaborators back the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process auth and store, nothing leaves the machine
    Memory,
    /// Firebase Auth and Cloud Firestore over REST
    Firebase,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Namespace segment of every collection path
    pub app_id: String,
    /// Firebase web config blob (JSON), if provided
    pub firebase_config: Option<String>,
    /// Custom token to sign in with instead of anonymous sign-in
    pub initial_auth_token: Option<String>,
    /// Which collaborators to use
    pub backend: BackendKind,
    /// How often the Firestore listener re-lists the collection
    pub poll_interval: Duration,
    /// How long success and mutation-failure messages stay up
    pub feedback_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: "default-app-id".to_string(),
            firebase_config: None,
            initial_auth_token: None,
            backend: BackendKind::Memory,
            poll_interval: Duration::from_millis(2000),
            feedback_ttl: Duration::from_millis(3000),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first; variables
    /// already set in the environment win.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `LARDER_APP_ID` | `default-app-id` |
    /// | `LARDER_FIREBASE_CONFIG` | unset |
    /// | `LARDER_INITIAL_AUTH_TOKEN` | unset |
    /// | `LARDER_BACKEND` | `firebase` when a config blob is set, else `memory` |
    /// | `LARDER_POLL_INTERVAL_MS` | `2000` |
    /// | `LARDER_FEEDBACK_TTL_MS` | `3000` |
    ///
    /// Durations of zero or that do not parse fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let firebase_config = non_empty("LARDER_FIREBASE_CONFIG");
        let backend = match non_empty("LARDER_BACKEND").as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("memory") => BackendKind::Memory,
            Some(kind) if kind.eq_ignore_ascii_case("firebase") => BackendKind::Firebase,
            Some(kind) => {
                tracing::warn!(backend = kind, "Unknown LARDER_BACKEND, picking from config");
                Self::default_backend(firebase_config.is_some())
            },
            None => Self::default_backend(firebase_config.is_some()),
        };

        Self {
            app_id: non_empty("LARDER_APP_ID").unwrap_or(defaults.app_id),
            firebase_config,
            initial_auth_token: non_empty("LARDER_INITIAL_AUTH_TOKEN"),
            backend,
            poll_interval: non_empty("LARDER_POLL_INTERVAL_MS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map_or(defaults.poll_interval, Duration::from_millis),
            feedback_ttl: non_empty("LARDER_FEEDBACK_TTL_MS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map_or(defaults.feedback_ttl, Duration::from_millis),
        }
    }

    const fn default_backend(has_firebase_config: bool) -> BackendKind {
        if has_firebase_config {
            BackendKind::Firebase
        } else {
            BackendKind::Memory
        }
    }

    /// Parse the Firebase config blob
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Init`] if the blob is missing, malformed, or
    /// lacks `apiKey`/`projectId`.
    pub fn firebase_options(&self) -> Result<FirebaseOptions, InventoryError> {
        let blob = self
            .firebase_config
            .as_deref()
            .ok_or_else(|| InventoryError::Init("LARDER_FIREBASE_CONFIG is not set".to_string()))?;

        FirebaseOptions::from_json(blob).map_err(|e| InventoryError::Init(e.to_string()))
    }
}
