//! Policy snapshots.

use serde::{Deserialize, Serialize};
use warden_core::{AccessLevel, AuditLevel, EnvironmentConfig, ScopeRules, Tier};

/// The governance rules in effect for one environment, as handed to operations.
///
/// Carries no credentials. `readonly` is the effective value, so a `reader`
/// tier environment is readonly even when `readonly: false` is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub environment: String,
    pub readonly: bool,
    pub require_approval: bool,
    pub tier: Tier,
    pub audit_level: AuditLevel,

    pub allowed_tools: Vec<String>,
    pub denied_tools: Vec<String>,

    pub access_level: AccessLevel,
    /// The environment's configured database.
    pub database: String,
    pub allowed_databases: Vec<String>,
    pub denied_databases: Vec<String>,
    pub allowed_schemas: Vec<String>,
    pub denied_schemas: Vec<String>,

    /// Row cap for read operations when the caller sets none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows_default: Option<u32>,
}

impl PolicySnapshot {
    pub fn from_environment(environment: &EnvironmentConfig) -> Self {
        Self {
            environment: environment.name.clone(),
            readonly: environment.is_effectively_readonly(),
            require_approval: environment.require_approval,
            tier: environment.tier,
            audit_level: environment.audit_level,
            allowed_tools: environment.allowed_tools.clone(),
            denied_tools: environment.denied_tools.clone(),
            access_level: environment.access_level,
            database: environment.database.clone(),
            allowed_databases: environment.allowed_databases.clone(),
            denied_databases: environment.denied_databases.clone(),
            allowed_schemas: environment.allowed_schemas.clone(),
            denied_schemas: environment.denied_schemas.clone(),
            max_rows_default: environment.max_rows_default,
        }
    }

    pub fn is_tool_denied(&self, tool: &str) -> bool {
        self.denied_tools.iter().any(|t| t == tool)
    }

    /// False only when an allow list exists and `tool` is not on it.
    pub fn is_tool_allowed(&self, tool: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == tool)
    }
}

impl ScopeRules for PolicySnapshot {
    fn scope_name(&self) -> &str {
        &self.environment
    }

    fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn allowed_databases(&self) -> &[String] {
        &self.allowed_databases
    }

    fn denied_databases(&self) -> &[String] {
        &self.denied_databases
    }

    fn allowed_schemas(&self) -> &[String] {
        &self.allowed_schemas
    }

    fn denied_schemas(&self) -> &[String] {
        &self.denied_schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_tier_is_readonly() {
        let env = EnvironmentConfig {
            tier: Tier::Reader,
            readonly: false,
            ..EnvironmentConfig::new("analytics", "localhost", "dw")
        };
        assert!(PolicySnapshot::from_environment(&env).readonly);
    }

    #[test]
    fn test_snapshot_omits_credentials() {
        let env = EnvironmentConfig {
            username: Some("app".to_string()),
            password: Some("hunter2".to_string()),
            ..EnvironmentConfig::new("dev", "localhost", "app")
        };
        let json = serde_json::to_string(&PolicySnapshot::from_environment(&env)).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_scope_rules_match_environment() {
        let env = EnvironmentConfig {
            denied_schemas: vec!["hr".to_string()],
            ..EnvironmentConfig::new("dev", "localhost", "app")
        };
        let snapshot = PolicySnapshot::from_environment(&env);
        assert_eq!(
            snapshot.is_schema_allowed("hr", Some("salaries")),
            env.is_schema_allowed("hr", Some("salaries"))
        );
        assert!(snapshot.is_database_allowed("APP").allowed);
    }
}
