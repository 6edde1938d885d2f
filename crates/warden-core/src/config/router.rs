//! Intent router settings.

use serde::{Deserialize, Serialize};

/// Configuration for prompt routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// When false, mutating and schema-changing operations are never selected.
    #[serde(default = "default_true")]
    pub allow_mutations: bool,

    /// When true, routed mutations need `confirm_intent` before they run.
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            allow_mutations: true,
            require_confirmation: true,
        }
    }
}

fn default_true() -> bool {
    true
}
