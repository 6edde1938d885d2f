//! Environment configuration.
//!
//! An environment is a named, fully specified connection target: server,
//! database, authentication and the governance policy applied to every
//! operation that runs against it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the registry authenticates against the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Username and password.
    #[default]
    Sql,
    /// Integrated OS authentication.
    Windows,
    /// Interactive directory token; handles expire with the token.
    Aad,
}

/// Scope of databases an environment may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Any database on the server, filtered by allow/deny lists.
    Server,
    /// Only the configured database.
    #[default]
    Database,
}

/// How much detail audit entries carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    /// No audit entries.
    None,
    /// Tool, environment, outcome and duration.
    #[default]
    Basic,
    /// Basic plus redacted arguments.
    Verbose,
}

/// Privilege tier of the environment. `Reader` forces readonly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Reader,
    #[default]
    Writer,
    Admin,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql => write!(f, "sql"),
            Self::Windows => write!(f, "windows"),
            Self::Aad => write!(f, "aad"),
        }
    }
}

/// Directory (AAD) app registration used when `auth_mode` is `aad`.
///
/// Tokens are obtained with the client-credentials grant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadSettings {
    pub tenant_id: String,

    pub client_id: String,

    /// Usually a `${secret:NAME}` reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Token scope requested from the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Identity provider base URL, e.g. `https://login.microsoftonline.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

impl fmt::Debug for AadSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AadSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("authority", &self.authority)
            .finish()
    }
}

/// A named connection target plus its policy.
///
/// Loaded once at startup and immutable afterwards.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Unique key across the registry.
    pub name: String,

    /// Optional free-form description shown in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Hostname of the database server.
    pub server: String,

    /// Database connected to by default. Required for `access_level: database`.
    #[serde(default)]
    pub database: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password, usually a `${secret:NAME}` reference resolved at load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<AadSettings>,

    #[serde(default)]
    pub access_level: AccessLevel,

    #[serde(default)]
    pub allowed_databases: Vec<String>,

    #[serde(default)]
    pub denied_databases: Vec<String>,

    #[serde(default)]
    pub allowed_schemas: Vec<String>,

    #[serde(default)]
    pub denied_schemas: Vec<String>,

    /// When non-empty, only these tools may run.
    #[serde(default)]
    pub allowed_tools: Vec<String>,

    /// Always rejected; wins over `allowed_tools`.
    #[serde(default)]
    pub denied_tools: Vec<String>,

    #[serde(default)]
    pub readonly: bool,

    /// Row cap handed to read operations when the caller does not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows_default: Option<u32>,

    #[serde(default)]
    pub require_approval: bool,

    #[serde(default)]
    pub audit_level: AuditLevel,

    #[serde(default)]
    pub tier: Tier,
}

impl EnvironmentConfig {
    /// Minimal environment with default policy; mostly useful in tests and tooling.
    pub fn new(name: impl Into<String>, server: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            server: server.into(),
            database: database.into(),
            port: None,
            auth_mode: AuthMode::default(),
            username: None,
            password: None,
            aad: None,
            access_level: AccessLevel::default(),
            allowed_databases: Vec::new(),
            denied_databases: Vec::new(),
            allowed_schemas: Vec::new(),
            denied_schemas: Vec::new(),
            allowed_tools: Vec::new(),
            denied_tools: Vec::new(),
            readonly: false,
            max_rows_default: None,
            require_approval: false,
            audit_level: AuditLevel::default(),
            tier: Tier::default(),
        }
    }

    /// Whether mutating operations are blocked, either explicitly or by tier.
    pub fn is_effectively_readonly(&self) -> bool {
        self.readonly || self.tier == Tier::Reader
    }

    /// Check internal consistency. Returns every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("environment name must not be empty".to_string());
        }

        if self.server.trim().is_empty() {
            problems.push(format!("environment '{}': server must not be empty", self.name));
        }

        if self.access_level == AccessLevel::Database && self.database.trim().is_empty() {
            problems.push(format!(
                "environment '{}': access_level 'database' requires a database",
                self.name
            ));
        }

        if self.auth_mode == AuthMode::Sql && self.username.as_deref().is_none_or(str::is_empty) {
            problems.push(format!(
                "environment '{}': auth_mode 'sql' requires a username",
                self.name
            ));
        }

        if self.auth_mode == AuthMode::Aad {
            match &self.aad {
                None => problems.push(format!(
                    "environment '{}': auth_mode 'aad' requires an 'aad' block",
                    self.name
                )),
                Some(aad) if aad.tenant_id.trim().is_empty() || aad.client_id.trim().is_empty() => {
                    problems.push(format!(
                        "environment '{}': aad.tenant_id and aad.client_id must not be empty",
                        self.name
                    ))
                }
                Some(_) => {}
            }
        }

        for tool in &self.allowed_tools {
            if self.denied_tools.iter().any(|d| d == tool) {
                problems.push(format!(
                    "environment '{}': tool '{}' is in both allowed_tools and denied_tools",
                    self.name, tool
                ));
            }
        }

        problems
    }
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("name", &self.name)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("port", &self.port)
            .field("auth_mode", &self.auth_mode)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("aad", &self.aad)
            .field("access_level", &self.access_level)
            .field("readonly", &self.readonly)
            .field("require_approval", &self.require_approval)
            .field("audit_level", &self.audit_level)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}
