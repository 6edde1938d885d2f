//! Routing prompts to registered tools.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use warden_core::{ErrorCode, RouterConfig, ToolResult};
use warden_policy::{CONFIRM_ARG, ENVIRONMENT_ARG, PolicyEnforcer, ToolRegistry};

use crate::operation::OperationSpec;
use crate::plan::{RoutePlan, RoutePlanner, RouteRequest};

/// A routing decision and what came of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteOutcome {
    pub plan: RoutePlan,
    pub result: ToolResult,
}

/// Turns free-text requests into policy-checked tool calls.
///
/// Only operations with a registered tool of the same name are candidates.
pub struct IntentRouter {
    enforcer: Arc<PolicyEnforcer>,
    tools: ToolRegistry,
    planner: RoutePlanner,
}

impl IntentRouter {
    pub fn new(
        enforcer: Arc<PolicyEnforcer>,
        tools: ToolRegistry,
        operations: Vec<OperationSpec>,
        config: RouterConfig,
    ) -> Self {
        let (routable, orphaned): (Vec<_>, Vec<_>) = operations
            .into_iter()
            .partition(|op| tools.contains(&op.name));
        for op in &orphaned {
            tracing::debug!(operation = %op.name, "No tool registered; operation not routable");
        }

        Self {
            enforcer,
            tools,
            planner: RoutePlanner::new(routable, config),
        }
    }

    pub fn planner(&self) -> &RoutePlanner {
        &self.planner
    }

    /// Decide how `request` would be routed without running anything.
    pub fn plan(&self, request: &RouteRequest) -> RoutePlan {
        let names: Vec<&str> = self
            .enforcer
            .registry()
            .environments()
            .iter()
            .map(|env| env.name.as_str())
            .collect();
        self.planner.plan(request, &names)
    }

    /// Route `request` and run the chosen operation through the enforcer.
    ///
    /// Every outcome, including failures of the operation itself, comes
    /// back as a [`ToolResult`].
    pub async fn route(&self, request: RouteRequest) -> RouteOutcome {
        let plan = self.plan(&request);
        let result = self.execute(&plan, request).await;
        RouteOutcome { plan, result }
    }

    async fn execute(&self, plan: &RoutePlan, request: RouteRequest) -> ToolResult {
        let Some(candidate) = plan.selected() else {
            tracing::info!(intent = %plan.classification.intent, "No operation matched prompt");
            return ToolResult::failure(
                ErrorCode::NoToolMatch,
                format!(
                    "no operation matches the request (intent: {})",
                    plan.classification.intent
                ),
            )
            .with_hint("rephrase the request or set preferred_operation");
        };
        let name = candidate.operation.as_str();

        let (Some(op), Some(tool)) = (self.planner.operation(name), self.tools.get(name)) else {
            return ToolResult::failure(
                ErrorCode::NoToolMatch,
                format!("operation '{}' has no registered tool", name),
            );
        };

        if !candidate.missing_args.is_empty() {
            return ToolResult::failure(
                ErrorCode::MissingArguments,
                format!("'{}' needs: {}", name, candidate.missing_args.join(", ")),
            )
            .with_hint("supply the missing values in tool_arguments and retry")
            .with_details(json!({
                "operation": name,
                "missing": candidate.missing_args,
            }));
        }

        let caps = tool.capabilities();
        let needs_confirmation = op.needs_confirmation()
            || caps.mutates
            || caps.schema_change
            || caps.requires_confirmation;
        if needs_confirmation
            && self.planner.config().require_confirmation
            && !request.confirm_intent
        {
            return ToolResult::failure(
                ErrorCode::ConfirmationRequired,
                format!("'{}' may change data and needs confirmation", name),
            )
            .with_hint("re-run with confirm_intent: true")
            .with_details(json!({
                "operation": name,
                "arguments": request.tool_arguments,
            }));
        }

        let arguments = match merge_arguments(plan, &request) {
            Ok(arguments) => arguments,
            Err(message) => {
                return ToolResult::failure(ErrorCode::InvalidArguments, message)
                    .with_hint("pass tool_arguments as an object with a string 'environment'");
            }
        };

        tracing::info!(
            operation = %name,
            score = ?candidate.score,
            environment = ?plan.environment.as_ref().map(|e| e.name.as_str()),
            "Routing prompt"
        );

        match self.enforcer.invoke(tool.as_ref(), arguments).await {
            Ok(result) => result,
            Err(err) => ToolResult::failure(
                ErrorCode::RoutedToolFailed,
                format!("routed operation '{}' failed: {}", name, err),
            )
            .with_hint("see the details for the underlying error")
            .with_details(json!({
                "operation": name,
                "cause": err.code(),
            })),
        }
    }
}

/// Caller arguments plus the inferred environment and confirmation.
fn merge_arguments(plan: &RoutePlan, request: &RouteRequest) -> Result<Value, String> {
    let mut merged = match &request.tool_arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => return Err("tool_arguments must be a JSON object".to_string()),
    };
    match merged.get(ENVIRONMENT_ARG) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(other) => {
            return Err(format!(
                "'{}' must be an environment name string, got {}",
                ENVIRONMENT_ARG, other
            ));
        }
    }
    if let Some(environment) = &plan.environment {
        merged.insert(ENVIRONMENT_ARG.to_string(), json!(environment.name));
    }
    if request.confirm_intent {
        merged.insert(CONFIRM_ARG.to_string(), json!(true));
    }
    Ok(Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{EnvironmentMatch, EnvironmentSource};
    use crate::intent::{Classification, Intent, IntentSource};

    fn plan_for(environment: Option<&str>) -> RoutePlan {
        let planner = RoutePlanner::new(Vec::new(), RouterConfig::default());
        let mut plan = planner.plan(&RouteRequest::new("x"), &[] as &[&str]);
        plan.environment = environment.map(|name| EnvironmentMatch {
            name: name.to_string(),
            source: EnvironmentSource::Name,
        });
        plan.classification = Classification {
            intent: Intent::DataRead,
            source: IntentSource::Default,
        };
        plan
    }

    #[test]
    fn test_merge_adds_environment_and_confirm() {
        let request = RouteRequest::new("x")
            .with_arguments(json!({"table": "orders"}))
            .confirmed();
        let merged = merge_arguments(&plan_for(Some("prod-db")), &request).unwrap();
        assert_eq!(
            merged,
            json!({"table": "orders", "environment": "prod-db", "confirm": true})
        );
    }

    #[test]
    fn test_merge_without_inference_leaves_arguments() {
        let request = RouteRequest::new("x");
        assert_eq!(merge_arguments(&plan_for(None), &request), Ok(json!({})));
    }

    #[test]
    fn test_merge_rejects_non_object() {
        let request = RouteRequest::new("x").with_arguments(json!([1, 2]));
        assert!(merge_arguments(&plan_for(None), &request).is_err());
    }

    #[test]
    fn test_merge_rejects_non_string_environment() {
        let request = RouteRequest::new("x").with_arguments(json!({"environment": {"name": "dev"}}));
        let err = merge_arguments(&plan_for(None), &request).unwrap_err();
        assert!(err.contains("environment"));
    }
}
