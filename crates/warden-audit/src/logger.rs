//! Audit logger implementation.
//!
//! Provides the `AuditLogger` used by the policy enforcer to record every
//! invocation that reached execution.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use warden_core::{AuditConfig, AuditLevel, ToolResult};

use crate::entry::{AuditEntry, ResultSummary};
use crate::error::AuditError;
use crate::redact::redact_arguments;
use crate::storage::{AuditStorage, ConsoleStorage, DualStorage, JsonLinesStorage, NullStorage};

/// Who ran an invocation and how much of it to record.
#[derive(Debug, Clone)]
pub struct InvocationMeta {
    pub session_id: String,
    pub environment: String,
    pub audit_level: AuditLevel,
}

impl InvocationMeta {
    pub fn new(
        session_id: impl Into<String>,
        environment: impl Into<String>,
        audit_level: AuditLevel,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            environment: environment.into(),
            audit_level,
        }
    }
}

/// Filter for querying stored entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    pub tool_name: Option<String>,
    pub environment: Option<String>,
    pub session_id: Option<String>,
    pub success: Option<bool>,
    /// Keep only the most recent `limit` entries.
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(tool) = &self.tool_name
            && &entry.tool_name != tool
        {
            return false;
        }
        if let Some(env) = &self.environment
            && !entry.environment.eq_ignore_ascii_case(env)
        {
            return false;
        }
        if let Some(session) = &self.session_id
            && &entry.session_id != session
        {
            return false;
        }
        if let Some(success) = self.success
            && entry.result.success != success
        {
            return false;
        }
        true
    }

    /// Filter `entries` (oldest first) and apply the limit.
    pub fn apply(&self, entries: Vec<AuditEntry>) -> Vec<AuditEntry> {
        let mut kept: Vec<AuditEntry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        if let Some(limit) = self.limit
            && kept.len() > limit
        {
            kept.drain(..kept.len() - limit);
        }
        kept
    }
}

/// The main audit logger.
pub struct AuditLogger {
    enabled: bool,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Build a logger from configuration.
    ///
    /// With a path the log goes to a JSON-lines file (mirrored to tracing when
    /// `stdout` is set); without one, entries go to tracing only.
    pub fn from_config(config: &AuditConfig) -> Result<Self, AuditError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let storage: Arc<dyn AuditStorage> = match (&config.path, config.stdout) {
            (Some(path), true) => Arc::new(DualStorage::new(path)?),
            (Some(path), false) => Arc::new(JsonLinesStorage::new(path)?),
            (None, _) => Arc::new(ConsoleStorage::new()),
        };

        Ok(Self {
            enabled: true,
            storage,
        })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(storage: Arc<dyn AuditStorage>) -> Self {
        Self {
            enabled: true,
            storage,
        }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            storage: Arc::new(NullStorage::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one invocation.
    ///
    /// Never fails: a storage error is reported through `tracing` and the
    /// caller's result is unaffected.
    pub fn log_invocation(
        &self,
        tool_name: &str,
        arguments: &Value,
        result: &ToolResult,
        duration: Duration,
        meta: &InvocationMeta,
    ) {
        if !self.enabled || meta.audit_level == AuditLevel::None {
            return;
        }

        let arguments = match meta.audit_level {
            AuditLevel::Verbose => Some(redact_arguments(arguments)),
            _ => None,
        };

        let entry = AuditEntry {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            session_id: meta.session_id.clone(),
            tool_name: tool_name.to_string(),
            environment: meta.environment.clone(),
            audit_level: meta.audit_level,
            result: ResultSummary::from(result),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            arguments,
        };

        tracing::debug!(
            event_id = %entry.event_id,
            tool = %entry.tool_name,
            environment = %entry.environment,
            success = entry.result.success,
            "Audit entry"
        );

        if let Err(e) = self.storage.store(&entry) {
            tracing::warn!(
                error = %e,
                tool = %tool_name,
                environment = %meta.environment,
                "Failed to write audit entry"
            );
        }
    }

    /// Query stored entries.
    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        self.storage.query(filter)
    }
}
