//! # warden-policy
//!
//! Policy enforcement for Warden operations.
//!
//! Operations implement [`Tool`] (or [`TypedTool`] for typed arguments) and
//! are called through a [`PolicyEnforcer`], which applies the environment's
//! policy before any connection is opened:
//!
//! | Order | Check | Code |
//! |-------|-------|------|
//! | 1 | tool on `denied_tools` | `TOOL_DENIED` |
//! | 2 | `allowed_tools` set and tool not on it | `TOOL_NOT_ALLOWED` |
//! | 3 | readonly environment, mutating tool | `ENVIRONMENT_READONLY` |
//! | 4 | `require_approval`, non-metadata tool, no `confirm: true` | `APPROVAL_REQUIRED` |
//! | 5 | `database` / `schema` / `table` argument out of scope | `DATABASE_ACCESS_DENIED`, `SCHEMA_ACCESS_DENIED` |
//!
//! Admitted calls get `environment` and `policy` added to their arguments,
//! run against a registry connection and are audited.

pub mod catalog;
pub mod decision;
pub mod enforcer;
pub mod error;
pub mod snapshot;
pub mod tool;

pub use decision::{CONFIRM_ARG, Rejection, evaluate};
pub use enforcer::{Admission, ENVIRONMENT_ARG, GuardedTool, POLICY_ARG, PolicyEnforcer};
pub use error::InvocationError;
pub use snapshot::PolicySnapshot;
pub use tool::{Tool, ToolContext, ToolRegistry, TypedTool};
