//! # warden-audit
//!
//! Audit logging for Warden.
//!
//! Every operation that passes policy and reaches execution produces one
//! [`AuditEntry`], on success and on failure alike, unless the environment's
//! audit level is `none`.
//!
//! ## Levels
//!
//! | Level | Recorded |
//! |-------|----------|
//! | `none` | nothing |
//! | `basic` | tool, environment, session, outcome, duration |
//! | `verbose` | basic plus arguments, with credential-like keys redacted |
//!
//! ## Guarantees
//!
//! - Each entry is written as one complete line under a lock, so concurrent
//!   writers never interleave partial records.
//! - [`AuditLogger::log_invocation`] never fails. Storage errors are reported
//!   through `tracing` and swallowed.
//!
//! ## Example
//!
//! ```rust
//! use warden_audit::{AuditLogger, InvocationMeta, MemoryStorage};
//! use warden_core::{AuditLevel, ToolResult};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let logger = AuditLogger::with_storage(storage.clone());
//!
//! logger.log_invocation(
//!     "read_data",
//!     &serde_json::json!({"table": "orders"}),
//!     &ToolResult::success(serde_json::json!({"rows": 3})),
//!     Duration::from_millis(12),
//!     &InvocationMeta::new("session-1", "dev", AuditLevel::Basic),
//! );
//!
//! assert_eq!(storage.len(), 1);
//! ```

pub mod entry;
pub mod error;
pub mod logger;
pub mod redact;
pub mod storage;

pub use entry::{AuditEntry, ResultSummary};
pub use error::AuditError;
pub use logger::{AuditFilter, AuditLogger, InvocationMeta};
pub use redact::redact_arguments;
pub use storage::{
    AuditStorage, ConsoleStorage, DualStorage, JsonLinesStorage, MemoryStorage, NullStorage,
};
