//! `warden environments` command implementation.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use warden_core::{AuthMode, WardenConfig};
use warden_policy::PolicySnapshot;

/// Public view of one environment. Never carries credentials.
#[derive(Debug, Serialize)]
pub struct EnvironmentView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub database: String,
    pub auth_mode: AuthMode,
    pub default: bool,
    pub policy: PolicySnapshot,
}

pub fn describe(config: &WardenConfig) -> Vec<EnvironmentView> {
    config
        .environments
        .iter()
        .map(|env| EnvironmentView {
            name: env.name.clone(),
            description: env.description.clone(),
            server: env.server.clone(),
            port: env.port,
            database: env.database.clone(),
            auth_mode: env.auth_mode,
            default: config.default_environment.as_deref() == Some(env.name.as_str()),
            policy: PolicySnapshot::from_environment(env),
        })
        .collect()
}

pub fn run(path: &Path) -> Result<()> {
    let config = super::load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&describe(&config))?);
    Ok(())
}
