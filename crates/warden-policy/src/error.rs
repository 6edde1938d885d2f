//! Error types for tool invocation.

use thiserror::Error;
use warden_core::{ErrorCode, ToolResult};
use warden_registry::RegistryError;

/// Infrastructure failures raised after policy admitted a call.
///
/// Policy rejections are never errors; they come back as failed
/// [`ToolResult`]s.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("tool '{tool}': {source}")]
    Connection {
        tool: String,
        #[source]
        source: RegistryError,
    },

    #[error("tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

impl InvocationError {
    pub fn tool_name(&self) -> &str {
        match self {
            Self::Connection { tool, .. } | Self::Tool { tool, .. } => tool,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection { source, .. } => source.code(),
            Self::Tool { .. } => ErrorCode::ToolFailed,
        }
    }

    /// Convert into the uniform result shape, for callers that must not fail.
    pub fn to_tool_result(&self) -> ToolResult {
        let hint = match self {
            Self::Connection { source, .. } => source.hint(),
            Self::Tool { .. } => "the operation failed unexpectedly; check the server logs",
        };
        ToolResult::failure(self.code(), self.to_string()).with_hint(hint)
    }
}
