//! Stable error codes.
//!
//! Every rejection or failure that reaches a caller carries one of these
//! codes. They serialize as `SCREAMING_SNAKE_CASE` strings and are safe for
//! agents to branch on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories of failures surfaced in a [`ToolResult`](crate::ToolResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // =========================================================================
    // Registry / infrastructure
    // =========================================================================
    /// The requested environment is not registered.
    EnvironmentNotFound,
    /// Connection establishment exceeded the configured timeout.
    ConnectionTimeout,
    /// Credentials or token acquisition were rejected.
    AuthenticationFailed,
    /// Any other connection failure.
    ConnectionFailed,
    /// The registry has been shut down.
    RegistryClosed,

    // =========================================================================
    // Policy
    // =========================================================================
    /// Tool is on the environment's deny list.
    ToolDenied,
    /// Environment has an allow list and the tool is not on it.
    ToolNotAllowed,
    /// Mutating tool called against a readonly environment.
    EnvironmentReadonly,
    /// Environment requires explicit confirmation for this tool.
    ApprovalRequired,
    /// Database named in the arguments is outside the environment's scope.
    DatabaseAccessDenied,
    /// Schema or table named in the arguments is outside the environment's scope.
    SchemaAccessDenied,

    // =========================================================================
    // Routing
    // =========================================================================
    /// No operation scored above zero for the prompt.
    NoToolMatch,
    /// The selected operation is missing required arguments.
    MissingArguments,
    /// The selected operation needs `confirm_intent` before it runs.
    ConfirmationRequired,
    /// The routed operation failed unexpectedly.
    RoutedToolFailed,

    // =========================================================================
    // Operation
    // =========================================================================
    /// Arguments could not be decoded into the operation's argument type.
    InvalidArguments,
    /// The operation failed unexpectedly.
    ToolFailed,
}

impl ErrorCode {
    /// The wire representation of this code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnvironmentNotFound => "ENVIRONMENT_NOT_FOUND",
            Self::ConnectionTimeout => "CONNECTION_TIMEOUT",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::RegistryClosed => "REGISTRY_CLOSED",
            Self::ToolDenied => "TOOL_DENIED",
            Self::ToolNotAllowed => "TOOL_NOT_ALLOWED",
            Self::EnvironmentReadonly => "ENVIRONMENT_READONLY",
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::DatabaseAccessDenied => "DATABASE_ACCESS_DENIED",
            Self::SchemaAccessDenied => "SCHEMA_ACCESS_DENIED",
            Self::NoToolMatch => "NO_TOOL_MATCH",
            Self::MissingArguments => "MISSING_ARGUMENTS",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::RoutedToolFailed => "ROUTED_TOOL_FAILED",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::ToolFailed => "TOOL_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
