//! The policy enforcer.
//!
//! Every operation call goes through [`PolicyEnforcer::invoke`]:
//!
//! 1. resolve the environment (`environment` argument, else the default)
//! 2. snapshot its policy
//! 3. evaluate deny / allow / readonly / approval / scope, see [`crate::decision`]
//! 4. enrich the arguments with `environment` and `policy`
//! 5. acquire a connection from the registry
//! 6. run the operation
//! 7. audit the outcome (success and failure alike)
//!
//! Steps 1-4 are pure: a rejection there never opens a connection, never runs
//! the operation and is not audited.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;
use warden_audit::{AuditLogger, InvocationMeta};
use warden_core::{ErrorCode, ToolCapabilities, ToolResult};
use warden_registry::EnvironmentRegistry;

use crate::decision;
use crate::error::InvocationError;
use crate::snapshot::PolicySnapshot;
use crate::tool::{Tool, ToolContext};

/// Argument naming the target environment.
pub const ENVIRONMENT_ARG: &str = "environment";

/// Argument carrying the policy snapshot into the operation.
pub const POLICY_ARG: &str = "policy";

/// A call that passed policy, ready for connection acquisition.
#[derive(Debug, Clone)]
pub struct Admission {
    pub environment: String,
    pub policy: PolicySnapshot,
    pub raw_arguments: Value,
    pub arguments: Value,
}

pub struct PolicyEnforcer {
    registry: EnvironmentRegistry,
    audit: Arc<AuditLogger>,
    session_id: String,
}

impl PolicyEnforcer {
    pub fn new(registry: EnvironmentRegistry, audit: Arc<AuditLogger>) -> Self {
        Self {
            registry,
            audit,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    /// Decorate `tool` so every call goes through this enforcer.
    pub fn wrap(self: &Arc<Self>, tool: Arc<dyn Tool>) -> GuardedTool {
        GuardedTool {
            tool,
            enforcer: Arc::clone(self),
        }
    }

    /// Run the pure admission phase for a call.
    ///
    /// `Err` carries the structured rejection to return to the caller.
    pub fn admit(
        &self,
        tool: &str,
        capabilities: &ToolCapabilities,
        arguments: &Value,
    ) -> Result<Admission, ToolResult> {
        let mut enriched = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(ToolResult::failure(
                    ErrorCode::InvalidArguments,
                    format!("arguments for '{}' must be a JSON object", tool),
                )
                .with_hint("pass arguments as an object, e.g. {\"table\": \"orders\"}"));
            }
        };

        let requested = match enriched.get(ENVIRONMENT_ARG) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.as_str()),
            Some(other) => {
                return Err(ToolResult::failure(
                    ErrorCode::InvalidArguments,
                    format!(
                        "'{}' must be an environment name string, got {}",
                        ENVIRONMENT_ARG, other
                    ),
                )
                .with_hint("pass the environment by name, e.g. {\"environment\": \"dev\"}"));
            }
        };
        let environment = self.registry.resolve(requested).map_err(|e| {
            ToolResult::failure(e.code(), e.to_string()).with_hint(e.hint())
        })?;

        let policy = PolicySnapshot::from_environment(environment);
        let raw_arguments = Value::Object(enriched.clone());

        decision::evaluate(tool, capabilities, &policy, &raw_arguments)
            .map_err(decision::Rejection::into_result)?;

        enriched.insert(
            ENVIRONMENT_ARG.to_string(),
            Value::String(environment.name.clone()),
        );
        // PolicySnapshot is plain data; serialization cannot fail.
        enriched.insert(
            POLICY_ARG.to_string(),
            serde_json::to_value(&policy).unwrap_or(Value::Null),
        );

        Ok(Admission {
            environment: environment.name.clone(),
            policy,
            raw_arguments,
            arguments: Value::Object(enriched),
        })
    }

    /// Invoke `tool` under policy.
    ///
    /// Rejections come back as `Ok` with `success: false`. Connection and
    /// operation failures are audited and returned as `Err`.
    pub async fn invoke(
        &self,
        tool: &dyn Tool,
        arguments: Value,
    ) -> Result<ToolResult, InvocationError> {
        let name = tool.name().to_string();

        let admission = match self.admit(&name, &tool.capabilities(), &arguments) {
            Ok(admission) => admission,
            Err(rejection) => {
                tracing::info!(
                    tool = %name,
                    code = ?rejection.error,
                    session = %self.session_id,
                    "Policy rejected tool call"
                );
                return Ok(rejection);
            }
        };

        let started_at = Utc::now();
        let timer = Instant::now();
        let meta = InvocationMeta::new(
            &self.session_id,
            &admission.environment,
            admission.policy.audit_level,
        );

        let connection = match self
            .registry
            .get_connection(Some(&admission.environment))
            .await
        {
            Ok(connection) => connection,
            Err(source) => {
                let error = InvocationError::Connection {
                    tool: name.clone(),
                    source,
                };
                tracing::warn!(
                    tool = %name,
                    environment = %admission.environment,
                    error = %error,
                    "Connection acquisition failed"
                );
                self.audit.log_invocation(
                    &name,
                    &admission.raw_arguments,
                    &error.to_tool_result(),
                    timer.elapsed(),
                    &meta,
                );
                return Err(error);
            }
        };

        let ctx = ToolContext {
            environment: admission.environment.clone(),
            policy: admission.policy,
            raw_arguments: admission.raw_arguments,
            arguments: admission.arguments,
            started_at,
            session_id: self.session_id.clone(),
            connection,
        };

        match tool.run(&ctx).await {
            Ok(result) => {
                tracing::debug!(
                    tool = %name,
                    environment = %ctx.environment,
                    success = result.success,
                    "Tool call finished"
                );
                self.audit
                    .log_invocation(&name, &ctx.raw_arguments, &result, timer.elapsed(), &meta);
                Ok(result)
            }
            Err(source) => {
                let error = InvocationError::Tool {
                    tool: name.clone(),
                    source,
                };
                tracing::error!(
                    tool = %name,
                    environment = %ctx.environment,
                    error = %error,
                    "Tool call failed"
                );
                self.audit.log_invocation(
                    &name,
                    &ctx.raw_arguments,
                    &error.to_tool_result(),
                    timer.elapsed(),
                    &meta,
                );
                Err(error)
            }
        }
    }
}

/// A tool decorated with policy enforcement.
#[derive(Clone)]
pub struct GuardedTool {
    tool: Arc<dyn Tool>,
    enforcer: Arc<PolicyEnforcer>,
}

impl GuardedTool {
    pub fn name(&self) -> &str {
        self.tool.name()
    }

    pub fn capabilities(&self) -> ToolCapabilities {
        self.tool.capabilities()
    }

    pub async fn call(&self, arguments: Value) -> Result<ToolResult, InvocationError> {
        self.enforcer.invoke(self.tool.as_ref(), arguments).await
    }
}
