//! Pure routing decisions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_core::RouterConfig;

use crate::environment::{EnvironmentMatch, infer_environment};
use crate::intent::{Classification, classify};
use crate::operation::OperationSpec;
use crate::scoring::{self, RoutingCandidate, ScoreInput, ScoredOperation};

/// A free-text request to route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub prompt: String,

    /// Arguments for the chosen operation.
    #[serde(default)]
    pub tool_arguments: Value,

    /// The caller accepts that the routed operation may change data.
    #[serde(default)]
    pub confirm_intent: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_operation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl RouteRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.tool_arguments = arguments;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirm_intent = true;
        self
    }

    pub fn prefer(mut self, operation: impl Into<String>) -> Self {
        self.preferred_operation = Some(operation.into());
        self
    }

    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }
}

/// The full routing decision for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    /// `None` defers to the registry's default environment.
    pub environment: Option<EnvironmentMatch>,
    #[serde(flatten)]
    pub classification: Classification,
    /// Every candidate in registration order.
    pub candidates: Vec<RoutingCandidate>,
    /// Index into `candidates` of the winner, if any scored above zero.
    #[serde(skip)]
    selected: Option<usize>,
    #[serde(rename = "selected")]
    selected_name: Option<String>,
}

impl RoutePlan {
    pub fn selected(&self) -> Option<&RoutingCandidate> {
        self.selected.map(|i| &self.candidates[i])
    }

    /// Candidates ordered best first, excluded ones last.
    pub fn ranked(&self) -> Vec<&RoutingCandidate> {
        let mut ranked: Vec<_> = self.candidates.iter().collect();
        ranked.sort_by_key(|c| std::cmp::Reverse(c.score.unwrap_or(i64::MIN)));
        ranked
    }
}

/// Scores a fixed set of operations against requests.
///
/// Holds no connection or registry state, so the same inputs always give
/// the same plan.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    operations: Vec<ScoredOperation>,
    config: RouterConfig,
}

impl RoutePlanner {
    pub fn new(operations: Vec<OperationSpec>, config: RouterConfig) -> Self {
        Self {
            operations: operations.into_iter().map(ScoredOperation::new).collect(),
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.operations.iter().map(|op| &op.spec)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.operations().find(|op| op.name == name)
    }

    pub fn plan<S: AsRef<str>>(&self, request: &RouteRequest, environments: &[S]) -> RoutePlan {
        let environment = infer_environment(
            request.environment.as_deref(),
            &request.tool_arguments,
            &request.prompt,
            environments,
        );
        let classification = classify(&request.prompt, &request.tool_arguments);

        let input = ScoreInput {
            prompt: &request.prompt,
            arguments: &request.tool_arguments,
            intent: classification.intent,
            preferred: request.preferred_operation.as_deref(),
            allow_mutations: self.config.allow_mutations,
        };
        let candidates: Vec<_> = self
            .operations
            .iter()
            .map(|op| scoring::score(op, &input))
            .collect();

        let selected = scoring::best(&candidates)
            .filter(|&i| candidates[i].score.is_some_and(|score| score > 0));

        RoutePlan {
            environment,
            classification,
            selected_name: selected.map(|i| candidates[i].operation.clone()),
            candidates,
            selected,
        }
    }
}
