//! Error types for the environment registry.

use thiserror::Error;
use warden_core::ErrorCode;

/// Errors raised while resolving environments or acquiring connections.
///
/// `Clone` so that every caller sharing one in-flight connect attempt
/// receives the same error value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("environment '{0}' not found")]
    EnvironmentNotFound(String),

    #[error("no environment specified and no default environment configured")]
    NoDefaultEnvironment,

    #[error("connection to environment '{environment}' timed out after {seconds}s")]
    ConnectionTimeout { environment: String, seconds: u64 },

    #[error("authentication failed for environment '{environment}': {message}")]
    AuthenticationFailed { environment: String, message: String },

    #[error("connection to environment '{environment}' failed: {message}")]
    ConnectionFailed { environment: String, message: String },

    #[error("environment registry is closed")]
    Closed,
}

impl RegistryError {
    /// Stable code surfaced to callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EnvironmentNotFound(_) | Self::NoDefaultEnvironment => {
                ErrorCode::EnvironmentNotFound
            }
            Self::ConnectionTimeout { .. } => ErrorCode::ConnectionTimeout,
            Self::AuthenticationFailed { .. } => ErrorCode::AuthenticationFailed,
            Self::ConnectionFailed { .. } => ErrorCode::ConnectionFailed,
            Self::Closed => ErrorCode::RegistryClosed,
        }
    }

    /// What the caller can do about it.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::EnvironmentNotFound(_) => "list the configured environments and pick one of them",
            Self::NoDefaultEnvironment => {
                "pass an environment name or set default_environment in the configuration"
            }
            Self::ConnectionTimeout { .. } => {
                "the server did not answer in time; check reachability and retry"
            }
            Self::AuthenticationFailed { .. } => {
                "check the credentials or token configuration for this environment"
            }
            Self::ConnectionFailed { .. } => "check the server address and retry",
            Self::Closed => "the registry is shutting down; no new connections are opened",
        }
    }

    pub(crate) fn auth(environment: &str, message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            environment: environment.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn failed(environment: &str, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            environment: environment.to_string(),
            message: message.into(),
        }
    }
}
