//! Database and schema scope checks for one environment.
//!
//! Deny lists are always evaluated first and win over allow lists.

use crate::config::{AccessLevel, EnvironmentConfig};
use crate::pattern::matches_any;
use serde::{Deserialize, Serialize};

/// Outcome of a scope check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCheck {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AccessCheck {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Database and schema scope rules, shared by environment configs and policy snapshots.
pub trait ScopeRules {
    /// Name used in denial reasons.
    fn scope_name(&self) -> &str;
    fn access_level(&self) -> AccessLevel;
    /// The configured database.
    fn database(&self) -> &str;
    fn allowed_databases(&self) -> &[String];
    fn denied_databases(&self) -> &[String];
    fn allowed_schemas(&self) -> &[String];
    fn denied_schemas(&self) -> &[String];

    /// Whether `database` may be used.
    ///
    /// With `access_level: database` only the configured database is allowed
    /// (case-insensitive). With `access_level: server` the deny list is checked
    /// first, then the allow list; an empty allow list allows everything not denied.
    fn is_database_allowed(&self, database: &str) -> AccessCheck {
        match self.access_level() {
            AccessLevel::Database => {
                if database.to_lowercase() == self.database().to_lowercase() {
                    AccessCheck::allow()
                } else {
                    AccessCheck::deny(format!(
                        "environment '{}' is restricted to database '{}'",
                        self.scope_name(),
                        self.database()
                    ))
                }
            }
            AccessLevel::Server => {
                if matches_any(database, self.denied_databases()) {
                    return AccessCheck::deny(format!(
                        "database '{}' is denied in environment '{}'",
                        database,
                        self.scope_name()
                    ));
                }
                if self.allowed_databases().is_empty()
                    || matches_any(database, self.allowed_databases())
                {
                    AccessCheck::allow()
                } else {
                    AccessCheck::deny(format!(
                        "database '{}' is not in the allowed databases of environment '{}'",
                        database,
                        self.scope_name()
                    ))
                }
            }
        }
    }

    /// Whether `schema` (optionally narrowed to `table`) may be used.
    ///
    /// Deny patterns are matched against both `schema` and `schema.table`.
    /// When an allow list is present, either form must match it.
    fn is_schema_allowed(&self, schema: &str, table: Option<&str>) -> AccessCheck {
        let qualified = table.map(|t| format!("{}.{}", schema, t));
        let target = qualified.as_deref().unwrap_or(schema);
        let hit = |patterns: &[String]| {
            matches_any(schema, patterns)
                || qualified.as_deref().is_some_and(|q| matches_any(q, patterns))
        };

        if hit(self.denied_schemas()) {
            return AccessCheck::deny(format!(
                "'{}' is denied in environment '{}'",
                target,
                self.scope_name()
            ));
        }

        if self.allowed_schemas().is_empty() || hit(self.allowed_schemas()) {
            AccessCheck::allow()
        } else {
            AccessCheck::deny(format!(
                "'{}' is not in the allowed schemas of environment '{}'",
                target,
                self.scope_name()
            ))
        }
    }
}

impl ScopeRules for EnvironmentConfig {
    fn scope_name(&self) -> &str {
        &self.name
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

    fn database_env() -> EnvironmentConfig {
        EnvironmentConfig::new("dev", "localhost", "Sales")
    }

    fn server_env() -> EnvironmentConfig {
        EnvironmentConfig {
            access_level: AccessLevel::Server,
            allowed_databases: vec!["sales*".to_string(), "crm".to_string()],
            denied_databases: vec!["sales_archive".to_string()],
            ..EnvironmentConfig::new("srv", "localhost", "")
        }
    }

    #[test]
    fn test_database_level_only_configured_database() {
        let env = database_env();
        assert!(env.is_database_allowed("sales").allowed);
        assert!(env.is_database_allowed("SALES").allowed);
        let check = env.is_database_allowed("crm");
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("restricted to database 'Sales'"));
    }

    #[test]
    fn test_database_level_ignores_allow_list() {
        let env = EnvironmentConfig {
            allowed_databases: vec!["*".to_string()],
            ..database_env()
        };
        assert!(!env.is_database_allowed("other").allowed);
    }

    #[test]
    fn test_server_level_deny_wins() {
        let env = server_env();
        assert!(env.is_database_allowed("sales_2024").allowed);
        assert!(env.is_database_allowed("CRM").allowed);
        assert!(!env.is_database_allowed("sales_archive").allowed);
        assert!(!env.is_database_allowed("hr").allowed);
    }

    #[test]
    fn test_server_level_star_and_empty_allow_list() {
        let star = EnvironmentConfig {
            allowed_databases: vec!["*".to_string()],
            ..server_env()
        };
        assert!(star.is_database_allowed("anything").allowed);

        let open = EnvironmentConfig {
            allowed_databases: Vec::new(),
            denied_databases: vec!["master".to_string()],
            ..server_env()
        };
        assert!(open.is_database_allowed("anything").allowed);
        assert!(!open.is_database_allowed("MASTER").allowed);
    }

    #[test]
    fn test_schema_deny_matches_schema_or_qualified_table() {
        let env = EnvironmentConfig {
            denied_schemas: vec!["hr".to_string(), "dbo.audit_*".to_string()],
            ..database_env()
        };
        assert!(!env.is_schema_allowed("hr", None).allowed);
        assert!(!env.is_schema_allowed("HR", Some("employees")).allowed);
        assert!(!env.is_schema_allowed("dbo", Some("audit_log")).allowed);
        assert!(env.is_schema_allowed("dbo", Some("orders")).allowed);
        assert!(env.is_schema_allowed("dbo", None).allowed);
    }

    #[test]
    fn test_schema_allow_list_restricts() {
        let env = EnvironmentConfig {
            allowed_schemas: vec!["sales".to_string(), "dbo.customers".to_string()],
            ..database_env()
        };
        assert!(env.is_schema_allowed("sales", Some("orders")).allowed);
        assert!(env.is_schema_allowed("dbo", Some("customers")).allowed);
        assert!(!env.is_schema_allowed("dbo", Some("orders")).allowed);
        assert!(!env.is_schema_allowed("finance", None).allowed);
    }

    #[test]
    fn test_schema_deny_beats_allow() {
        let env = EnvironmentConfig {
            allowed_schemas: vec!["*".to_string()],
            denied_schemas: vec!["*.secrets".to_string()],
            ..database_env()
        };
        assert!(env.is_schema_allowed("app", Some("users")).allowed);
        assert!(!env.is_schema_allowed("app", Some("secrets")).allowed);
    }
}
