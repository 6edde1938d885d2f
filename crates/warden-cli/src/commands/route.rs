//! `warden route` command implementation.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use warden_core::WardenConfig;
use warden_router::{RoutePlan, RoutePlanner, RouteRequest, default_catalog};

#[derive(Debug, Default)]
pub struct RouteArgs {
    pub prompt: String,
    pub args: Option<String>,
    pub prefer: Option<String>,
    pub environment: Option<String>,
}

/// Plan a route against the built-in operation catalog.
pub fn plan(config: &WardenConfig, args: RouteArgs) -> Result<RoutePlan> {
    let tool_arguments = match args.args.as_deref() {
        Some(raw) => {
            serde_json::from_str::<Value>(raw).context("--args must be a JSON object")?
        }
        None => Value::Null,
    };
    anyhow::ensure!(
        tool_arguments.is_null() || tool_arguments.is_object(),
        "--args must be a JSON object"
    );

    let request = RouteRequest {
        prompt: args.prompt,
        tool_arguments,
        confirm_intent: false,
        preferred_operation: args.prefer,
        environment: args.environment,
    };

    let names: Vec<&str> = config.environments.iter().map(|e| e.name.as_str()).collect();
    let planner = RoutePlanner::new(default_catalog(), config.router.clone());
    Ok(planner.plan(&request, &names))
}

pub fn run(path: &Path, args: RouteArgs) -> Result<()> {
    let config = super::load_config(path)?;
    let plan = plan(&config, args)?;

    match plan.selected() {
        Some(selected) => tracing::info!(operation = %selected.operation, "Selected operation"),
        None => tracing::warn!("No operation matched; a routed call would return NO_TOOL_MATCH"),
    }
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
