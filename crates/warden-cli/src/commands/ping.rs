//! `warden ping` command implementation.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use warden_adapter_pg::{PgConnector, PgConnectorOptions, PgPoolConnection};
use warden_core::{ConnectionSettings, WardenConfig};
use warden_registry::{ClientCredentialsProvider, EnvironmentRegistry};

/// Pool options honouring the configured connect timeout.
fn connector_options(settings: &ConnectionSettings) -> PgConnectorOptions {
    PgConnectorOptions {
        acquire_timeout: settings.connect_timeout(),
        ..Default::default()
    }
}

/// Registry backed by Postgres with client-credentials tokens for `aad` environments.
pub fn build_registry(config: WardenConfig) -> Result<EnvironmentRegistry> {
    let connector = PgConnector::new(connector_options(&config.connection));
    let tokens = ClientCredentialsProvider::new(config.connection.connect_timeout())
        .context("failed to build token client")?;

    EnvironmentRegistry::builder(config, Arc::new(connector))
        .token_provider(Arc::new(tokens))
        .build()
        .context("invalid configuration")
}

pub async fn run(path: &Path, environment: Option<&str>) -> Result<()> {
    let registry = build_registry(super::load_config(path)?)?;

    let target = registry.resolve(environment)?.name.clone();
    println!("📡 Connecting to '{}'...", target);

    let started = Instant::now();
    let handle = match registry.get_connection(Some(&target)).await {
        Ok(handle) => handle,
        Err(err) => {
            registry.close_all().await;
            return Err(err).with_context(|| format!("could not connect to '{}'", target));
        }
    };
    let elapsed = started.elapsed();

    let server_version = match handle.downcast_ref::<PgPoolConnection>() {
        Some(pg) => sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(pg.pool())
            .await
            .map_err(|err| tracing::warn!(error = %err, "Version query failed"))
            .ok(),
        None => None,
    };

    let report = json!({
        "environment": handle.environment(),
        "handle_id": handle.id(),
        "opened_at": handle.opened_at(),
        "expires_at": handle.expires_at(),
        "connected": handle.is_connected(),
        "state": registry.connection_state(Some(&target)).ok(),
        "connect_ms": elapsed.as_millis() as u64,
        "connect_timeout_secs": registry.settings().connect_timeout_secs,
        "server_version": server_version,
    });

    registry.close_all().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
