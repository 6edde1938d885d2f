//! # warden-core
//!
//! Types shared by every Warden crate:
//!
//! - [`config`]: the configuration document, `EnvironmentConfig` and load-time validation
//! - [`secret`]: `${secret:NAME}` interpolation against process-level variables
//! - [`pattern`]: case-insensitive, fully anchored `*` wildcard matching
//! - [`access`]: database and schema allow/deny evaluation for one environment
//! - [`error`]: stable error codes surfaced to callers
//! - [`tool`]: the uniform result shape every operation returns

pub mod access;
pub mod config;
pub mod error;
pub mod pattern;
pub mod secret;
pub mod tool;

pub use access::{AccessCheck, ScopeRules};
pub use config::{
    AadSettings, AccessLevel, AuditConfig, AuditLevel, AuthMode, ConfigError, ConnectionSettings,
    EnvironmentConfig, RouterConfig, Tier, WardenConfig,
};
pub use error::ErrorCode;
pub use pattern::{matches, matches_any};
pub use secret::{ProcessEnv, SecretSource};
pub use tool::{ToolCapabilities, ToolResult};
