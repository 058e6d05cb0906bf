//! Bearer token verification.
//!
//! The server never signs users in. It only asks the identity provider who
//! owns a token:
//!
//! - [`IdentityVerifier::Remote`] calls the Identity Toolkit `accounts:lookup`
//!   endpoint with the project API key.
//! - [`IdentityVerifier::Static`] resolves tokens from a fixed table, used in
//!   development and tests.
//! - [`IdentityVerifier::Disabled`] rejects everything with "not configured".
use std::{collections::HashMap, time::Duration};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// A verified identity, as reported by the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Identity provider not configured")]
    NotConfigured,
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for VerifyError {
    fn from(value: reqwest::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct RemoteVerifier {
    client: Client,
    lookup_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    phone_number: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl From<LookupUser> for Identity {
    fn from(value: LookupUser) -> Self {
        Self {
            uid: value.local_id,
            email: value.email,
            phone_number: value.phone_number,
            display_name: value.display_name,
            photo_url: value.photo_url,
        }
    }
}

impl RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let resp = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token: token })
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            return Err(VerifyError::InvalidToken);
        }
        if !status.is_success() {
            tracing::warn!(%status, "identity lookup failed");
            return Err(VerifyError::Unavailable(format!("lookup returned {status}")));
        }

        let body = resp.json::<LookupResponse>().await?;
        body.users
            .into_iter()
            .next()
            .map(Identity::from)
            .ok_or(VerifyError::InvalidToken)
    }
}

#[derive(Clone, Debug)]
pub enum IdentityVerifier {
    Remote(RemoteVerifier),
    Static(HashMap<String, Identity>),
    Disabled,
}

impl IdentityVerifier {
    /// Verifier backed by the Identity Toolkit REST API.
    pub fn remote(
        api_key: String,
        lookup_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, VerifyError> {
        if api_key.trim().is_empty() {
            return Err(VerifyError::NotConfigured);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::Remote(RemoteVerifier {
            client,
            lookup_url: lookup_url.unwrap_or_else(|| DEFAULT_LOOKUP_URL.to_string()),
            api_key,
        }))
    }

    /// Verifier resolving tokens from a fixed table.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (String, Identity)>,
    {
        Self::Static(tokens.into_iter().collect())
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerifyError::InvalidToken);
        }
        match self {
            Self::Remote(remote) => remote.verify(token).await,
            Self::Static(tokens) => tokens.get(token).cloned().ok_or(VerifyError::InvalidToken),
            Self::Disabled => Err(VerifyError::NotConfigured),
        }
    }
}
