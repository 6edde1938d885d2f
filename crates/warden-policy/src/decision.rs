//! Pure policy evaluation.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. `denied_tools`
//! 2. `allowed_tools`
//! 3. readonly (explicit or `reader` tier) against mutating tools
//! 4. `require_approval` against non-exempt tools without `confirm: true`
//! 5. database / schema / table named in the arguments
//!
//! Nothing here touches the network.

use serde_json::{Value, json};
use warden_core::{AccessCheck, ErrorCode, ScopeRules, ToolCapabilities, ToolResult};

use crate::catalog;
use crate::snapshot::PolicySnapshot;

/// Argument that confirms an approval-gated call.
pub const CONFIRM_ARG: &str = "confirm";

/// A policy rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub code: ErrorCode,
    pub message: String,
    pub hint: String,
    pub details: Option<Value>,
}

impl Rejection {
    fn new(code: ErrorCode, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: hint.into(),
            details: None,
        }
    }

    pub fn into_result(self) -> ToolResult {
        let result = ToolResult::failure(self.code, self.message).with_hint(self.hint);
        match self.details {
            Some(details) => result.with_details(details),
            None => result,
        }
    }
}

/// Whether the caller explicitly confirmed the call.
pub fn is_confirmed(arguments: &Value) -> bool {
    arguments.get(CONFIRM_ARG).and_then(Value::as_bool) == Some(true)
}

/// Evaluate policy for one call.
pub fn evaluate(
    tool: &str,
    capabilities: &ToolCapabilities,
    policy: &PolicySnapshot,
    arguments: &Value,
) -> Result<(), Rejection> {
    if policy.is_tool_denied(tool) {
        return Err(Rejection::new(
            ErrorCode::ToolDenied,
            format!("tool '{}' is denied in environment '{}'", tool, policy.environment),
            "use a different tool or environment",
        ));
    }

    if !policy.is_tool_allowed(tool) {
        return Err(Rejection::new(
            ErrorCode::ToolNotAllowed,
            format!(
                "tool '{}' is not in the allowed tools of environment '{}'",
                tool, policy.environment
            ),
            format!("allowed tools: {}", policy.allowed_tools.join(", ")),
        ));
    }

    if policy.readonly && catalog::is_mutating(tool, capabilities) {
        return Err(Rejection::new(
            ErrorCode::EnvironmentReadonly,
            format!(
                "environment '{}' is readonly; '{}' modifies data",
                policy.environment, tool
            ),
            "run this against a writable environment",
        ));
    }

    if policy.require_approval
        && !catalog::is_metadata_exempt(tool, capabilities)
        && !is_confirmed(arguments)
    {
        let mut rejection = Rejection::new(
            ErrorCode::ApprovalRequired,
            format!(
                "environment '{}' requires approval for '{}'",
                policy.environment, tool
            ),
            "review the arguments below, then re-run with confirm: true",
        );
        rejection.details = Some(json!({
            "tool": tool,
            "environment": policy.environment,
            "arguments": arguments,
        }));
        return Err(rejection);
    }

    check_scope(policy, arguments)
}

/// Check the database, schema and table an operation names.
///
/// A `table` of the form `schema.table` supplies the schema when none is
/// given separately. A bare table with no schema is left to the operation.
pub fn check_scope(policy: &PolicySnapshot, arguments: &Value) -> Result<(), Rejection> {
    let arg = |key: &str| {
        arguments
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    if let Some(database) = arg("database")
        && let AccessCheck {
            allowed: false,
            reason,
        } = policy.is_database_allowed(database)
    {
        return Err(Rejection::new(
            ErrorCode::DatabaseAccessDenied,
            reason.unwrap_or_else(|| format!("database '{}' is not allowed", database)),
            "pick a database this environment may access",
        ));
    }

    let (schema, table) = match (arg("schema"), arg("table")) {
        (Some(schema), table) => (Some(schema), table),
        (None, Some(table)) => match table.split_once('.') {
            Some((schema, table)) => (Some(schema), Some(table)),
            None => (None, Some(table)),
        },
        (None, None) => (None, None),
    };

    if let Some(schema) = schema
        && let AccessCheck {
            allowed: false,
            reason,
        } = policy.is_schema_allowed(schema, table)
    {
        return Err(Rejection::new(
            ErrorCode::SchemaAccessDenied,
            reason.unwrap_or_else(|| format!("schema '{}' is not allowed", schema)),
            "pick a schema or table this environment may access",
        ));
    }

    Ok(())
}
