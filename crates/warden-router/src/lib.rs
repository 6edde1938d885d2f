//! # warden-router
//!
//! Maps free-text prompts to registered operations.
//!
//! A route runs in two halves. [`RoutePlanner::plan`] is pure: it infers the
//! environment, classifies the intent and scores every operation. Then
//! [`IntentRouter::route`] applies the missing-argument and confirmation
//! gates and hands the call to the [`PolicyEnforcer`](warden_policy::PolicyEnforcer).
//!
//! A best score of zero or less is reported as `NO_TOOL_MATCH`; the router
//! never guesses.

pub mod environment;
pub mod intent;
pub mod operation;
pub mod plan;
pub mod router;
pub mod scoring;

pub use environment::{EnvironmentMatch, EnvironmentSource, infer_environment};
pub use intent::{Classification, Intent, IntentSource, classify};
pub use operation::{OperationSpec, default_catalog};
pub use plan::{RoutePlan, RoutePlanner, RouteRequest};
pub use router::{IntentRouter, RouteOutcome};
pub use scoring::RoutingCandidate;
