//! `${secret:NAME}` placeholder resolution.
//!
//! Placeholders are resolved once, at load time, against a [`SecretSource`]
//! (process environment variables in production). A placeholder whose name
//! cannot be resolved is left verbatim and reported; it is never replaced by an
//! empty string. Substituted values are not scanned again.

use regex::{Captures, Regex};
use serde_yaml::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Any `${secret:` token, terminated or not. Names are checked separately so
/// a malformed placeholder is reported instead of silently kept.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{secret:([^${}]*)(\})?").expect("placeholder regex is valid")
});

static SECRET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name regex is valid"));

/// Where secret values come from.
pub trait SecretSource: Send + Sync {
    /// Look up a secret by name. `None` means "not set".
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl SecretSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl SecretSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolve every placeholder in `input`.
///
/// Names that could not be resolved, and malformed placeholders, are appended
/// to `unresolved` (once each) and left verbatim.
pub fn resolve_str(input: &str, source: &dyn SecretSource, unresolved: &mut Vec<String>) -> String {
    if !input.contains("${secret:") {
        return input.to_string();
    }

    PLACEHOLDER
        .replace_all(input, |caps: &Captures<'_>| {
            let token = &caps[0];
            let name = &caps[1];
            if caps.get(2).is_none() || !SECRET_NAME.is_match(name) {
                if !unresolved.iter().any(|n| n == name) {
                    tracing::warn!(placeholder = %token, "Malformed secret placeholder; leaving it in configuration");
                    unresolved.push(name.to_string());
                }
                return token.to_string();
            }
            match source.lookup(name) {
                Some(value) => value,
                None => {
                    if !unresolved.iter().any(|n| n == name) {
                        tracing::warn!(
                            secret = %name,
                            "Secret is not set; leaving placeholder in configuration"
                        );
                        unresolved.push(name.to_string());
                    }
                    token.to_string()
                }
            }
        })
        .into_owned()
}

/// Resolve placeholders in every string scalar of a YAML tree, recursively.
///
/// Returns the names of placeholders that were left unresolved.
pub fn resolve_value(value: &mut Value, source: &dyn SecretSource) -> Vec<String> {
    let mut unresolved = Vec::new();
    walk(value, source, &mut unresolved);
    unresolved
}

fn walk(value: &mut Value, source: &dyn SecretSource, unresolved: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let resolved = resolve_str(s, source, unresolved);
            *s = resolved;
        }
        Value::Sequence(items) => {
            for item in items {
                walk(item, source, unresolved);
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                walk(item, source, unresolved);
            }
        }
        Value::Tagged(tagged) => walk(&mut tagged.value, source, unresolved),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolves_known_secret() {
        let mut unresolved = Vec::new();
        let out = resolve_str("${secret:DB_PASS}", &source(&[("DB_PASS", "hunter2")]), &mut unresolved);
        assert_eq!(out, "hunter2");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_unset_secret_is_preserved_verbatim() {
        let mut unresolved = Vec::new();
        let out = resolve_str("${secret:DB_PASS}", &source(&[]), &mut unresolved);
        assert_eq!(out, "${secret:DB_PASS}");
        assert_eq!(unresolved, vec!["DB_PASS".to_string()]);
    }

    #[test]
    fn test_embedded_placeholders() {
        let mut unresolved = Vec::new();
        let out = resolve_str(
            "Server=${secret:HOST};Password=${secret:PW};User=${secret:MISSING}",
            &source(&[("HOST", "db1"), ("PW", "p@ss")]),
            &mut unresolved,
        );
        assert_eq!(out, "Server=db1;Password=p@ss;User=${secret:MISSING}");
        assert_eq!(unresolved, vec!["MISSING".to_string()]);
    }

    #[test]
    fn test_malformed_placeholders_are_reported() {
        let mut unresolved = Vec::new();
        let out = resolve_str(
            "${secret:db-pass} ${secret:OK} ${secret:} ${secret:TRAILING",
            &source(&[("db-pass", "nope"), ("OK", "fine")]),
            &mut unresolved,
        );
        assert_eq!(out, "${secret:db-pass} fine ${secret:} ${secret:TRAILING");
        assert_eq!(
            unresolved,
            vec!["db-pass".to_string(), String::new(), "TRAILING".to_string()]
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut unresolved = Vec::new();
        let out = resolve_str(
            "${secret:OUTER}",
            &source(&[("OUTER", "${secret:INNER}"), ("INNER", "leak")]),
            &mut unresolved,
        );
        assert_eq!(out, "${secret:INNER}");
    }

    #[test]
    fn test_resolves_nested_yaml_tree() {
        let mut value: Value = serde_yaml::from_str(
            r#"
environments:
  - name: dev
    password: ${secret:DEV_PW}
    allowed_schemas: ["${secret:SCHEMA}", dbo]
  - name: prod
    password: ${secret:PROD_PW}
"#,
        )
        .unwrap();

        let unresolved = resolve_value(
            &mut value,
            &source(&[("DEV_PW", "dev-secret"), ("SCHEMA", "sales")]),
        );

        assert_eq!(unresolved, vec!["PROD_PW".to_string()]);
        let envs = value["environments"].as_sequence().unwrap();
        assert_eq!(envs[0]["password"].as_str(), Some("dev-secret"));
        assert_eq!(envs[0]["allowed_schemas"][0].as_str(), Some("sales"));
        assert_eq!(envs[1]["password"].as_str(), Some("${secret:PROD_PW}"));
    }

    #[test]
    fn test_unresolved_names_reported_once() {
        let mut value: Value =
            serde_yaml::from_str("a: ${secret:X}\nb: ${secret:X}\nc: 42\n").unwrap();
        let unresolved = resolve_value(&mut value, &source(&[]));
        assert_eq!(unresolved, vec!["X".to_string()]);
    }
}
