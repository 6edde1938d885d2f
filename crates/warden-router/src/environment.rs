//! Inferring the target environment from a prompt.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_policy::ENVIRONMENT_ARG;

/// Keyword clusters checked when no environment is named outright.
///
/// A cluster hit selects the first environment whose name contains one of
/// its targets.
const CLUSTERS: &[(&[&str], &[&str])] = &[
    (&["production", "prod", "live"], &["prod"]),
    (
        &["staging", "stage", "uat", "preprod"],
        &["staging", "stage", "stg", "uat"],
    ),
    (&["development", "dev", "local"], &["dev"]),
    (&["test", "testing", "qa"], &["test", "qa"]),
];

/// How the environment of a route was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", content = "value", rename_all = "snake_case")]
pub enum EnvironmentSource {
    /// Given on the request.
    Request,
    /// Given as an `environment` argument.
    Argument,
    /// The prompt mentions the environment's name.
    Name,
    /// The prompt contains a cluster keyword such as "prod".
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentMatch {
    pub name: String,
    #[serde(flatten)]
    pub source: EnvironmentSource,
}

/// Decide the environment for a route.
///
/// `None` leaves the choice to the registry default.
pub fn infer_environment<S: AsRef<str>>(
    explicit: Option<&str>,
    arguments: &Value,
    prompt: &str,
    environments: &[S],
) -> Option<EnvironmentMatch> {
    let non_empty = |s: &str| !s.trim().is_empty();

    if let Some(name) = explicit.filter(|s| non_empty(s)) {
        return Some(EnvironmentMatch {
            name: name.to_string(),
            source: EnvironmentSource::Request,
        });
    }

    match arguments.get(ENVIRONMENT_ARG) {
        Some(Value::String(name)) if non_empty(name.as_str()) => {
            return Some(EnvironmentMatch {
                name: name.clone(),
                source: EnvironmentSource::Argument,
            });
        }
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        // Malformed; the call is refused later, so nothing is inferred.
        Some(_) => return None,
    }

    if let Some(name) = environments
        .iter()
        .map(AsRef::as_ref)
        .find(|name| mentions_name(prompt, name))
    {
        return Some(EnvironmentMatch {
            name: name.to_string(),
            source: EnvironmentSource::Name,
        });
    }

    for (keywords, targets) in CLUSTERS {
        let Some(keyword) = keywords.iter().find(|kw| mentions_name(prompt, kw)) else {
            continue;
        };
        let hit = environments.iter().map(AsRef::as_ref).find(|name| {
            let lower = name.to_lowercase();
            targets.iter().any(|t| lower.contains(t))
        });
        if let Some(name) = hit {
            return Some(EnvironmentMatch {
                name: name.to_string(),
                source: EnvironmentSource::Keyword((*keyword).to_string()),
            });
        }
    }

    None
}

/// Whole-word, case-insensitive match where `-` in `name` may also be
/// written as whitespace or nothing.
fn mentions_name(prompt: &str, name: &str) -> bool {
    let pattern = name
        .split('-')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[-\s]?");
    if pattern.is_empty() {
        return false;
    }
    RegexBuilder::new(&format!(r"\b{}\b", pattern))
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(prompt))
        .unwrap_or(false)
}
