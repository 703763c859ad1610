//! Identity provider seam.
//!
//! [`IdentityProvider`] is what the session talks to. [`RestIdentityProvider`] speaks the
//! Identity Toolkit REST dialect (`accounts:signInWithPassword`, `accounts:signUp`).

use crate::{config::settings::IdentitySettings, errors::Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

/// A signed-in user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Provider user id
    pub uid: String,
    /// Email address
    pub email: String,
    /// Short-lived id token
    pub id_token: String,
}

/// Why a provider call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider answered and refused, with its error code
    Rejected {
        /// Provider error code (e.g. `EMAIL_NOT_FOUND`)
        code: String,
    },
    /// The provider could not be reached or answered with something unreadable
    Transport(String),
}

/// Remote email/password identity service.
pub trait IdentityProvider: Send + Sync {
    /// Signs an existing user in.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = std::result::Result<AuthUser, ProviderError>> + Send;

    /// Creates a new account and signs it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = std::result::Result<AuthUser, ProviderError>> + Send;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extracts the bare code from a provider message such as
/// `"WEAK_PASSWORD : Password should be at least 6 characters"`.
#[must_use]
pub fn error_code(message: &str) -> String {
    message
        .split(" : ")
        .next()
        .unwrap_or(message)
        .trim()
        .to_string()
}

/// Identity Toolkit compatible REST client.
#[derive(Clone)]
pub struct RestIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for RestIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestIdentityProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Turns a reqwest error into a transport error. The request URL carries the api key,
/// so it is stripped before the error is rendered.
fn transport(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(e.without_url().to_string())
}

impl RestIdentityProvider {
    /// Builds a client for the configured endpoint.
    pub fn new(settings: &IdentitySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    #[instrument(skip(self, password))]
    async fn call(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, ProviderError> {
        let url = format!("{}/accounts:{action}", self.base_url);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&CredentialsRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!("Identity provider answered {status}");

        if status.is_success() {
            let body: TokenResponse = response.json().await.map_err(transport)?;
            Ok(AuthUser {
                uid: body.local_id,
                email: if body.email.is_empty() {
                    email.to_string()
                } else {
                    body.email
                },
                id_token: body.id_token,
            })
        } else {
            let body: ErrorEnvelope = response.json().await.map_err(transport)?;
            Err(ProviderError::Rejected {
                code: error_code(&body.error.message),
            })
        }
    }
}

impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, ProviderError> {
        self.call("signInWithPassword", email, password).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthUser, ProviderError> {
        self.call("signUp", email, password).await
    }
}
