//! Audit logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the audit sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// JSON Lines file receiving one entry per invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Also emit entries through the console (tracing) backend.
    #[serde(default)]
    pub stdout: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            path: None,
            stdout: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}
