//! Identity Toolkit client: sign-in, account lookup and token refresh

use crate::{
    error::{FirebaseError, check_status, parse_failed, request_failed},
    options::FirebaseOptions,
};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// A signed-in Firebase user and their credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// The user's UID
    pub local_id: String,
    /// Short-lived bearer token for Firestore
    pub id_token: String,
    /// Long-lived token used to mint new ID tokens
    pub refresh_token: String,
    /// When `id_token` stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the ID token expires within `margin` of `now`
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at - margin <= now
    }
}

/// Identity Toolkit API client
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    api_key: String,
    identity_url: String,
    secure_token_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest {
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomTokenRequest<'a> {
    token: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    #[serde(default)]
    local_id: Option<String>,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

// The secure token service answers in snake_case
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

impl IdentityClient {
    /// Create a client for the project's API key
    #[must_use]
    pub fn new(options: &FirebaseOptions) -> Self {
        Self {
            client: Client::new(),
            api_key: options.api_key.clone(),
            identity_url: IDENTITY_URL.to_string(),
            secure_token_url: SECURE_TOKEN_URL.to_string(),
        }
    }

    /// Point the client at another host (the auth emulator, a mock server)
    #[must_use]
    pub fn with_base_urls(
        mut self,
        identity_url: impl Into<String>,
        secure_token_url: impl Into<String>,
    ) -> Self {
        self.identity_url = identity_url.into();
        self.secure_token_url = secure_token_url.into();
        self
    }

    /// Create a new anonymous account
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    #[tracing::instrument(skip(self))]
    pub async fn sign_up_anonymous(&self) -> Result<AuthSession, FirebaseError> {
        let response: TokenResponse = self
            .post(
                "accounts:signUp",
                &SignUpRequest {
                    return_secure_token: true,
                },
            )
            .await?;

        let local_id = response
            .local_id
            .ok_or_else(|| FirebaseError::ResponseParseFailed("missing localId".to_string()))?;

        tracing::debug!(%local_id, "Anonymous account created");
        session_from(local_id, response.id_token, response.refresh_token, &response.expires_in)
    }

    /// Exchange a custom token minted by a trusted server
    ///
    /// The exchange does not return the UID, so the account is looked up
    /// with the fresh ID token afterwards.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, rejected tokens, or parsing failures
    #[tracing::instrument(skip_all)]
    pub async fn sign_in_with_custom_token(
        &self,
        token: &str,
    ) -> Result<AuthSession, FirebaseError> {
        let response: TokenResponse = self
            .post(
                "accounts:signInWithCustomToken",
                &CustomTokenRequest {
                    token,
                    return_secure_token: true,
                },
            )
            .await?;

        let local_id = match response.local_id {
            Some(id) => id,
            None => self.lookup(&response.id_token).await?,
        };

        tracing::debug!(%local_id, "Custom token accepted");
        session_from(local_id, response.id_token, response.refresh_token, &response.expires_in)
    }

    /// Resolve the UID an ID token belongs to
    ///
    /// # Errors
    ///
    /// Returns `FirebaseError::NotFound` if the token matches no account
    pub async fn lookup(&self, id_token: &str) -> Result<String, FirebaseError> {
        let response: LookupResponse = self
            .post("accounts:lookup", &LookupRequest { id_token })
            .await?;

        response
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .ok_or(FirebaseError::NotFound)
    }

    /// Mint a new ID token from a refresh token
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, revoked tokens, or parsing failures
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, FirebaseError> {
        let response = self
            .client
            .post(format!("{}/token", self.secure_token_url))
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| request_failed(&e))?;

        let response: RefreshResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| parse_failed(&e))?;

        session_from(
            response.user_id,
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        )
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> Result<T, FirebaseError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.identity_url))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| request_failed(&e))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| parse_failed(&e))
    }
}

fn session_from(
    local_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: &str,
) -> Result<AuthSession, FirebaseError> {
    let seconds: i64 = expires_in
        .parse()
        .map_err(|_| FirebaseError::ResponseParseFailed(format!("expiresIn: {expires_in}")))?;

    Ok(AuthSession {
        local_id,
        id_token,
        refresh_token,
        expires_at: Utc::now() + Duration::seconds(seconds),
    })
}
