//! Uniform operation result and capability flags.

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result returned by every operation, policy rejection and routing decision.
///
/// Expected failures are `success: false` with an [`ErrorCode`] and a hint a
/// human or agent can act on. Infrastructure failures are reported through
/// error types instead and only converted into this shape at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,

    /// Actionable next step for the caller, e.g. "re-run with confirm: true".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Rejection context, such as the arguments echoed back for approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolResult {
    /// A successful result carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            hint: None,
            data: Some(data),
            details: None,
        }
    }

    /// A failed result.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error: Some(code),
            hint: None,
            data: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// What an operation can do, declared by the operation itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCapabilities {
    /// Writes rows (INSERT/UPDATE/DELETE).
    #[serde(default)]
    pub mutates: bool,

    /// Changes schema objects (CREATE/ALTER/DROP).
    #[serde(default)]
    pub schema_change: bool,

    /// Reads catalog metadata only; never gated by approval.
    #[serde(default)]
    pub metadata_exempt: bool,

    /// Routed calls need explicit confirmation even if nothing is written.
    #[serde(default)]
    pub requires_confirmation: bool,
}

impl ToolCapabilities {
    pub const fn read_only() -> Self {
        Self {
            mutates: false,
            schema_change: false,
            metadata_exempt: false,
            requires_confirmation: false,
        }
    }

    pub const fn metadata() -> Self {
        Self {
            metadata_exempt: true,
            ..Self::read_only()
        }
    }

    pub const fn mutating() -> Self {
        Self {
            mutates: true,
            ..Self::read_only()
        }
    }

    pub const fn schema_change() -> Self {
        Self {
            mutates: true,
            schema_change: true,
            ..Self::read_only()
        }
    }

    /// Whether the operation writes anything (rows or schema).
    pub const fn is_mutating(&self) -> bool {
        self.mutates || self.schema_change
    }
}
