//! Firebase project configuration

use crate::error::FirebaseError;
use serde::Deserialize;

/// Firestore's name for the database every project starts with
pub const DEFAULT_DATABASE: &str = "(default)";

/// Project settings needed to reach Firebase
///
/// Built from the web config object Firebase hands out per app
/// (`{"apiKey": ..., "authDomain": ..., "projectId": ...}`). Keys the clients
/// don't use are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseOptions {
    /// Browser API key, sent as `?key=` to the Identity Toolkit
    pub api_key: String,
    /// Project identifier used in Firestore resource names
    pub project_id: String,
    /// Hosting domain for auth redirects
    pub auth_domain: Option<String>,
    /// Firestore database identifier
    pub database_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    api_key: Option<String>,
    project_id: Option<String>,
    auth_domain: Option<String>,
    database_id: Option<String>,
}

impl FirebaseOptions {
    /// Create options for the default database
    #[must_use]
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_domain: None,
            database_id: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Parse the JSON config blob
    ///
    /// # Errors
    ///
    /// Returns `FirebaseError::ResponseParseFailed` if the blob is not a JSON
    /// object and `FirebaseError::MissingOption` if `apiKey` or `projectId`
    /// is absent or blank.
    pub fn from_json(json: &str) -> Result<Self, FirebaseError> {
        let raw: RawOptions =
            serde_json::from_str(json).map_err(|e| crate::error::parse_failed(&e))?;

        let api_key = non_blank(raw.api_key).ok_or(FirebaseError::MissingOption("apiKey"))?;
        let project_id =
            non_blank(raw.project_id).ok_or(FirebaseError::MissingOption("projectId"))?;

        Ok(Self {
            api_key,
            project_id,
            auth_domain: non_blank(raw.auth_domain),
            database_id: non_blank(raw.database_id)
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }

    /// Resource name of the database, `projects/{project}/databases/{database}`
    #[must_use]
    pub fn database_name(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_web_config_blob() {
        let options = FirebaseOptions::from_json(
            r#"{
                "apiKey": "key-123",
                "authDomain": "demo.firebaseapp.com",
                "projectId": "demo",
                "storageBucket": "demo.appspot.com",
                "appId": "1:2:web:3"
            }"#,
        )
        .unwrap();

        assert_eq!(options.api_key, "key-123");
        assert_eq!(options.project_id, "demo");
        assert_eq!(options.auth_domain.as_deref(), Some("demo.firebaseapp.com"));
        assert_eq!(options.database_id, DEFAULT_DATABASE);
        assert_eq!(options.database_name(), "projects/demo/databases/(default)");
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = FirebaseOptions::from_json(r#"{"projectId": "demo"}"#).unwrap_err();
        assert_eq!(err, FirebaseError::MissingOption("apiKey"));
    }

    #[test]
    fn blank_project_id_is_reported() {
        let err =
            FirebaseOptions::from_json(r#"{"apiKey": "k", "projectId": "  "}"#).unwrap_err();
        assert_eq!(err, FirebaseError::MissingOption("projectId"));
    }

    #[test]
    fn malformed_blob_is_a_parse_error() {
        let err = FirebaseOptions::from_json("not json").unwrap_err();
        assert!(matches!(err, FirebaseError::ResponseParseFailed(_)));
    }
}
