//! Error types for the Firebase REST clients

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to Firebase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FirebaseError {
    /// A required option is missing from the project configuration
    #[error("Missing Firebase option: {0}")]
    MissingOption(&'static str),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Credentials were rejected
    #[error("Unauthorized - credentials rejected")]
    Unauthorized,

    /// The document or account does not exist
    #[error("Not found")]
    NotFound,

    /// The document already exists
    #[error("Already exists")]
    AlreadyExists,

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a non-success response onto a [`FirebaseError`], passing successes through
pub(crate) async fn check_status(response: Response) -> Result<Response, FirebaseError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => Err(FirebaseError::RateLimited),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FirebaseError::Unauthorized),
        StatusCode::NOT_FOUND => Err(FirebaseError::NotFound),
        StatusCode::CONFLICT => Err(FirebaseError::AlreadyExists),
        status => {
            let body = response.text().await.unwrap_or_default();
            // Both services wrap failures as {"error": {"message": ...}}
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map_or(body, |envelope| envelope.error.message);
            Err(FirebaseError::ApiError {
                status: status.as_u16(),
                message,
            })
        },
    }
}

/// Convert a transport error
pub(crate) fn request_failed(error: &reqwest::Error) -> FirebaseError {
    FirebaseError::RequestFailed(error.to_string())
}

/// Convert a body decoding error
pub(crate) fn parse_failed(error: &impl std::fmt::Display) -> FirebaseError {
    FirebaseError::ResponseParseFailed(error.to_string())
}
