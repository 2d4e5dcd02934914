//! Bearer-token identity for admin-only endpoints
//!
//! Login and sessions live with the external identity provider; this service
//! only resolves an access token to the provider's user id and then checks
//! the caller's profile role.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::IdentityConfig;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider is not configured (set AUTH_URL and AUTH_API_KEY)")]
    NotConfigured,

    #[error("access token was rejected")]
    InvalidToken,

    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider responded with status {0}")]
    Unavailable(u16),
}

/// Resolves access tokens to identity-provider user ids
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_user(&self, token: &str) -> Result<Uuid, IdentityError>;
}

/// Token lookup against the provider's `/auth/v1/user` endpoint
pub struct RemoteIdentity {
    client: reqwest::Client,
    config: Option<IdentityConfig>,
}

#[derive(Deserialize)]
struct UserPayload {
    id: Uuid,
}

impl RemoteIdentity {
    pub fn new(client: reqwest::Client, config: Option<IdentityConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("AUTH_URL/AUTH_API_KEY not set; admin endpoints will refuse requests");
        }
        Self { client, config }
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentity {
    async fn resolve_user(&self, token: &str) -> Result<Uuid, IdentityError> {
        let config = self.config.as_ref().ok_or(IdentityError::NotConfigured)?;
        let url = format!("{}/auth/v1/user", config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(url)
            .header("apikey", &config.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IdentityError::InvalidToken);
        }
        if !status.is_success() {
            return Err(IdentityError::Unavailable(status.as_u16()));
        }

        let user: UserPayload = response.json().await?;
        Ok(user.id)
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
