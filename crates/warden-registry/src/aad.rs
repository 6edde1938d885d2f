//! Directory tokens via the OAuth 2.0 client-credentials grant.
//!
//! Each `aad` environment names its tenant and app registration in its
//! `aad` block. The token endpoint is
//! `{authority}/{tenant_id}/oauth2/v2.0/token`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use warden_core::EnvironmentConfig;

use crate::auth::{AccessToken, TokenProvider};
use crate::error::RegistryError;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Scope of Azure Database for PostgreSQL.
pub const DEFAULT_SCOPE: &str = "https://ossrdbms-aad.database.windows.net/.default";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Acquires tokens from the identity provider with each environment's
/// client id and secret.
#[derive(Debug, Clone)]
pub struct ClientCredentialsProvider {
    client: reqwest::Client,
}

impl ClientCredentialsProvider {
    /// `timeout` bounds each token request.
    pub fn new(timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn token_url(authority: Option<&str>, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority.unwrap_or(DEFAULT_AUTHORITY).trim_end_matches('/'),
        tenant_id
    )
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn acquire_token(
        &self,
        environment: &EnvironmentConfig,
    ) -> Result<AccessToken, RegistryError> {
        let name = environment.name.as_str();
        let settings = environment
            .aad
            .as_ref()
            .ok_or_else(|| RegistryError::auth(name, "auth_mode 'aad' requires an 'aad' block"))?;
        let secret = match settings.client_secret.as_deref() {
            None | Some("") => return Err(RegistryError::auth(name, "aad.client_secret is not set")),
            Some(s) if s.starts_with("${secret:") => {
                return Err(RegistryError::auth(
                    name,
                    "aad.client_secret references a secret that was not resolved",
                ));
            }
            Some(s) => s,
        };

        let url = token_url(settings.authority.as_deref(), &settings.tenant_id);
        let scope = settings.scope.as_deref().unwrap_or(DEFAULT_SCOPE);
        tracing::debug!(environment = %name, url = %url, scope = %scope, "Requesting access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", settings.client_id.as_str()),
                ("client_secret", secret),
                ("scope", scope),
            ])
            .send()
            .await
            .map_err(|e| RegistryError::failed(name, format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = match response.json::<TokenErrorResponse>().await {
                Ok(TokenErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{}: {}", error, description),
                Ok(body) => body.error,
                Err(_) => format!("token endpoint returned {}", status),
            };
            return Err(RegistryError::auth(name, reason));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::auth(name, format!("malformed token response: {}", e)))?;
        let expires_at = Duration::try_seconds(body.expires_in.max(0))
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| RegistryError::auth(name, "token lifetime is out of range"))?;

        Ok(AccessToken {
            token: body.access_token,
            expires_at,
        })
    }
}
