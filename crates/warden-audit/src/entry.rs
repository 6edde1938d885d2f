//! Audit entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AuditLevel, ErrorCode, ToolResult};

/// Condensed outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&ToolResult> for ResultSummary {
    fn from(result: &ToolResult) -> Self {
        Self {
            success: result.success,
            error: result.error,
            message: result.message.clone(),
        }
    }
}

/// One audited tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID.
    pub event_id: Uuid,

    /// When the invocation finished.
    pub timestamp: DateTime<Utc>,

    /// Session of the enforcer that ran the call.
    pub session_id: String,

    /// Tool (operation) name.
    pub tool_name: String,

    /// Resolved environment name.
    pub environment: String,

    /// Level the entry was recorded at.
    pub audit_level: AuditLevel,

    /// Outcome of the call.
    pub result: ResultSummary,

    /// Wall time spent in connection acquisition and execution.
    pub duration_ms: u64,

    /// Redacted arguments; only present at `verbose`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Format the entry as a single human-readable line.
    pub fn to_log_line(&self) -> String {
        let status = match (&self.result.success, &self.result.error) {
            (true, _) => "OK".to_string(),
            (false, Some(code)) => code.to_string(),
            (false, None) => "FAILED".to_string(),
        };
        format!(
            "[{} - {} - {} - {}ms] session={}",
            self.environment, self.tool_name, status, self.duration_ms, self.session_id
        )
    }
}
