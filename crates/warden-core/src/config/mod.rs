//! Configuration types for Warden.
//!
//! The configuration document is YAML (JSON works too) and is loaded once at
//! startup. `${secret:NAME}` placeholders are resolved over the parsed tree
//! before typed deserialization, then the whole document is validated.
//!
//! ```yaml
//! default_environment: dev
//! environments:
//!   - name: dev
//!     server: localhost
//!     database: app
//!     username: app
//!     password: ${secret:DEV_DB_PASSWORD}
//! ```

pub mod audit;
pub mod connection;
pub mod environment;
pub mod router;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::secret::{self, ProcessEnv, SecretSource};

pub use audit::AuditConfig;
pub use connection::ConnectionSettings;
pub use environment::{AadSettings, AccessLevel, AuditLevel, AuthMode, EnvironmentConfig, Tier};
pub use router::RouterConfig;

/// Complete Warden configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WardenConfig {
    /// Environment used when a call does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,

    /// Registered environments, in declaration order.
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    /// Connection cache settings.
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Prompt routing settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Placeholders that could not be resolved at load time.
    #[serde(skip)]
    pub unresolved_secrets: Vec<String>,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl WardenConfig {
    /// Load configuration from a file, resolving secrets from the process environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration, resolving secrets from the process environment.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_with(content, &ProcessEnv)
    }

    /// Parse configuration, resolving secrets from `secrets`.
    pub fn from_yaml_with(content: &str, secrets: &dyn SecretSource) -> Result<Self, ConfigError> {
        let mut tree: serde_yaml::Value = serde_yaml::from_str(content)?;
        let unresolved = secret::resolve_value(&mut tree, secrets);

        let mut config: WardenConfig = serde_yaml::from_value(tree)?;
        config.unresolved_secrets = unresolved;
        config.validate()?;

        tracing::debug!(
            environments = config.environments.len(),
            default = ?config.default_environment,
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Check cross-environment invariants and each environment's own rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for env in &self.environments {
            if !seen.insert(env.name.to_lowercase()) {
                problems.push(format!("duplicate environment name '{}'", env.name));
            }
            problems.extend(env.validate());
        }

        if let Some(default) = &self.default_environment
            && self.get_environment(default).is_none()
        {
            problems.push(format!(
                "default_environment '{}' is not a registered environment",
                default
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Get an environment by exact name.
    pub fn get_environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
default_environment: dev
environments:
  - name: dev
    server: localhost
    database: app
    username: app
    password: ${secret:DB_PASS}
  - name: prod-db
    server: prod.example.com
    database: sales
    auth_mode: aad
    aad:
      tenant_id: contoso
      client_id: 00000000-0000-0000-0000-000000000001
      client_secret: ${secret:AAD_SECRET}
    readonly: true
    require_approval: true
    audit_level: verbose
    denied_schemas: ["hr", "audit_*"]
connection:
  connect_timeout_secs: 10
router:
  allow_mutations: false
"#;

    fn secrets(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_resolves_secret() {
        let config = WardenConfig::from_yaml_with(
            SAMPLE,
            &secrets(&[("DB_PASS", "hunter2"), ("AAD_SECRET", "s3cret")]),
        )
        .unwrap();
        let dev = config.get_environment("dev").unwrap();
        assert_eq!(dev.password.as_deref(), Some("hunter2"));
        let aad = config.get_environment("prod-db").unwrap().aad.as_ref().unwrap();
        assert_eq!(aad.tenant_id, "contoso");
        assert_eq!(aad.client_secret.as_deref(), Some("s3cret"));
        assert!(config.unresolved_secrets.is_empty());
    }

    #[test]
    fn test_load_preserves_unresolved_placeholder() {
        let config = WardenConfig::from_yaml_with(SAMPLE, &secrets(&[])).unwrap();
        let dev = config.get_environment("dev").unwrap();
        assert_eq!(dev.password.as_deref(), Some("${secret:DB_PASS}"));
        assert_eq!(
            config.unresolved_secrets,
            vec!["DB_PASS".to_string(), "AAD_SECRET".to_string()]
        );
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = WardenConfig::from_yaml_with(SAMPLE, &secrets(&[])).unwrap();
        assert_eq!(config.connection.connect_timeout_secs, 10);
        assert_eq!(config.connection.token_refresh_margin_secs, 120);
        assert!(!config.router.allow_mutations);
        assert!(config.router.require_confirmation);
        assert!(config.audit.enabled);

        let prod = config.get_environment("prod-db").unwrap();
        assert_eq!(prod.auth_mode, AuthMode::Aad);
        assert_eq!(prod.audit_level, AuditLevel::Verbose);
        assert_eq!(prod.denied_schemas, vec!["hr".to_string(), "audit_*".to_string()]);
    }

    #[test]
    fn test_json_document_is_accepted() {
        let json = r#"{"environments": [{"name": "dev", "server": "h", "database": "d", "username": "u"}]}"#;
        let config = WardenConfig::from_yaml_with(json, &secrets(&[])).unwrap();
        assert_eq!(config.environments.len(), 1);
        assert!(config.default_environment.is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = r#"
environments:
  - { name: dev, server: a, database: x, username: u }
  - { name: DEV, server: b, database: y, username: u }
"#;
        let err = WardenConfig::from_yaml_with(yaml, &secrets(&[])).unwrap_err();
        assert!(err.to_string().contains("duplicate environment name 'DEV'"));
    }

    #[test]
    fn test_unknown_default_rejected() {
        let yaml = r#"
default_environment: staging
environments:
  - { name: dev, server: a, database: x, username: u }
"#;
        let err = WardenConfig::from_yaml_with(yaml, &secrets(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_all_problems_reported_together() {
        let yaml = r#"
environments:
  - name: a
    server: h
    username: u
    allowed_tools: [read_data]
    denied_tools: [read_data]
"#;
        let Err(ConfigError::Invalid(problems)) = WardenConfig::from_yaml_with(yaml, &secrets(&[])) else {
            panic!("expected validation failure");
        };
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.yaml");
        std::fs::write(&path, "environments: []\n").unwrap();

        let config = WardenConfig::from_file(&path).unwrap();
        assert!(config.environments.is_empty());
    }
}
