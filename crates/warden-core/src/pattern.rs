//! Wildcard pattern matching for database and schema allow/deny lists.
//!
//! A pattern is a glob where `*` matches any run of characters (including an
//! empty one). Matching is case-insensitive and anchored to the whole value:
//! `audit_*` matches `audit_log` but not `myaudit_log`.

use regex::{Regex, RegexBuilder};

/// Check whether `value` matches the wildcard `pattern`.
pub fn matches(value: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return value.to_lowercase() == pattern.to_lowercase();
    }

    match compile(pattern) {
        Some(regex) => regex.is_match(value),
        None => false,
    }
}

/// Check whether `value` matches at least one of `patterns`.
pub fn matches_any<S: AsRef<str>>(value: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches(value, p.as_ref()))
}

/// Convert a wildcard pattern into an anchored regex.
///
/// Every non-`*` segment is escaped, so characters such as `.` or `$` in
/// object names are matched literally.
fn compile(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(true)
        .build()
        .ok()
}
