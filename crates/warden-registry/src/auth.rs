//! Authentication-specific connection parameters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use warden_core::{AuthMode, ConnectionSettings, EnvironmentConfig};

use crate::error::RegistryError;

/// A directory access token and its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credentials handed to a connector.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthParams {
    Sql {
        username: String,
        password: Option<String>,
    },
    /// Integrated OS authentication.
    Windows { username: Option<String> },
    /// Directory token used in place of a password.
    Token {
        username: Option<String>,
        token: AccessToken,
    },
}

impl fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql { username, password } => f
                .debug_struct("Sql")
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Windows { username } => {
                f.debug_struct("Windows").field("username", username).finish()
            }
            Self::Token { username, token } => f
                .debug_struct("Token")
                .field("username", username)
                .field("token", token)
                .finish(),
        }
    }
}

/// Everything a connector needs to open one environment's connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub environment: String,
    pub server: String,
    pub port: Option<u16>,
    pub database: String,
    pub auth: AuthParams,
    pub max_connections: u32,
}

impl ConnectParams {
    /// When the resulting connection stops being valid.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.auth {
            AuthParams::Token { token, .. } => Some(token.expires_at),
            _ => None,
        }
    }
}

/// Acquires directory tokens for `aad` environments.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(&self, environment: &EnvironmentConfig)
    -> Result<AccessToken, RegistryError>;
}

/// Rejects every token request. Used when no provider is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredTokenProvider;

#[async_trait]
impl TokenProvider for UnconfiguredTokenProvider {
    async fn acquire_token(
        &self,
        environment: &EnvironmentConfig,
    ) -> Result<AccessToken, RegistryError> {
        Err(RegistryError::auth(
            &environment.name,
            "auth_mode 'aad' requires a token provider, none is configured",
        ))
    }
}

/// Build connection parameters for `environment`, acquiring a token if needed.
pub async fn connect_params(
    environment: &EnvironmentConfig,
    settings: &ConnectionSettings,
    tokens: &dyn TokenProvider,
) -> Result<ConnectParams, RegistryError> {
    let auth = match environment.auth_mode {
        AuthMode::Sql => {
            let username = environment
                .username
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    RegistryError::auth(&environment.name, "auth_mode 'sql' requires a username")
                })?;
            AuthParams::Sql {
                username,
                password: environment.password.clone(),
            }
        }
        AuthMode::Windows => AuthParams::Windows {
            username: environment.username.clone(),
        },
        AuthMode::Aad => {
            let token = tokens.acquire_token(environment).await?;
            tracing::debug!(
                environment = %environment.name,
                expires_at = %token.expires_at,
                "Acquired access token"
            );
            AuthParams::Token {
                username: environment.username.clone(),
                token,
            }
        }
    };

    Ok(ConnectParams {
        environment: environment.name.clone(),
        server: environment.server.clone(),
        port: environment.port,
        database: environment.database.clone(),
        auth,
        max_connections: settings.max_pool_connections,
    })
}
