//! The operation contract.
//!
//! Every leaf operation implements [`Tool`], usually through [`TypedTool`],
//! which decodes the arguments into a typed struct first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use warden_core::{ErrorCode, ToolCapabilities, ToolResult};
use warden_registry::ConnectionHandle;

use crate::snapshot::PolicySnapshot;

/// Per-call context handed to an operation after policy has admitted it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Resolved environment name.
    pub environment: String,
    pub policy: PolicySnapshot,
    /// Arguments as the caller sent them.
    pub raw_arguments: Value,
    /// Arguments plus `environment` and `policy`.
    pub arguments: Value,
    pub started_at: DateTime<Utc>,
    pub session_id: String,
    pub connection: Arc<ConnectionHandle>,
}

/// A leaf operation.
///
/// Expected failures are `Ok` results with `success: false`; `Err` is
/// reserved for infrastructure failures.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn capabilities(&self) -> ToolCapabilities;

    async fn run(&self, ctx: &ToolContext) -> anyhow::Result<ToolResult>;
}

/// A [`Tool`] with a typed argument struct.
#[async_trait]
pub trait TypedTool: Send + Sync {
    type Args: DeserializeOwned + Send;

    const NAME: &'static str;

    fn description(&self) -> &str {
        ""
    }

    fn capabilities(&self) -> ToolCapabilities;

    async fn execute(&self, args: Self::Args, ctx: &ToolContext) -> anyhow::Result<ToolResult>;
}

#[async_trait]
impl<T: TypedTool> Tool for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        TypedTool::description(self)
    }

    fn capabilities(&self) -> ToolCapabilities {
        TypedTool::capabilities(self)
    }

    async fn run(&self, ctx: &ToolContext) -> anyhow::Result<ToolResult> {
        match serde_json::from_value::<T::Args>(ctx.arguments.clone()) {
            Ok(args) => self.execute(args, ctx).await,
            Err(e) => Ok(ToolResult::failure(
                ErrorCode::InvalidArguments,
                format!("invalid arguments for '{}': {}", T::NAME, e),
            )
            .with_hint("check argument names and types against the tool description")),
        }
    }
}

/// Registered operations, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
