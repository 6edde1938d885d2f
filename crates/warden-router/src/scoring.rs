//! Candidate scoring.
//!
//! ```text
//! score = base_score
//!       + 5  if the operation serves the classified intent
//!       + 3  if it is the caller's preferred operation
//!       + 2  per keyword present in the prompt
//!       + 1  per required argument present
//!       - 1  per required argument missing
//! ```
//!
//! Mutating and schema-changing operations have no score at all when the
//! router does not allow mutations.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::intent::{Intent, phrase_regex};
use crate::operation::OperationSpec;

const INTENT_WEIGHT: i64 = 5;
const PREFERRED_WEIGHT: i64 = 3;
const KEYWORD_WEIGHT: i64 = 2;
const ARG_PRESENT_WEIGHT: i64 = 1;
const ARG_MISSING_PENALTY: i64 = 1;

/// An operation together with its precompiled keyword patterns.
#[derive(Debug, Clone)]
pub struct ScoredOperation {
    pub spec: OperationSpec,
    keywords: Vec<(String, Regex)>,
}

impl ScoredOperation {
    pub fn new(spec: OperationSpec) -> Self {
        let keywords = spec
            .keywords
            .iter()
            .filter_map(|kw| phrase_regex(kw).map(|re| (kw.clone(), re)))
            .collect();
        Self { spec, keywords }
    }
}

/// One ranked option for a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingCandidate {
    pub operation: String,
    /// `None` when the operation is excluded outright.
    pub score: Option<i64>,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_args: Vec<String>,
}

/// Inputs shared by every candidate in one routing decision.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub prompt: &'a str,
    pub arguments: &'a Value,
    pub intent: Intent,
    pub preferred: Option<&'a str>,
    pub allow_mutations: bool,
}

/// Whether `arguments` supplies a usable value for `key`.
///
/// Null and blank strings count as missing.
pub fn has_argument(arguments: &Value, key: &str) -> bool {
    match arguments.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

pub fn score(op: &ScoredOperation, input: &ScoreInput<'_>) -> RoutingCandidate {
    let spec = &op.spec;
    let missing_args: Vec<String> = spec
        .required_args
        .iter()
        .filter(|arg| !has_argument(input.arguments, arg))
        .cloned()
        .collect();

    if !input.allow_mutations && (spec.mutates_data || spec.schema_change) {
        return RoutingCandidate {
            operation: spec.name.clone(),
            score: None,
            reasons: vec!["mutations are disabled".to_string()],
            missing_args,
        };
    }

    let mut total = spec.base_score;
    let mut reasons = Vec::new();
    if spec.base_score != 0 {
        reasons.push(format!("base {}", spec.base_score));
    }

    if spec.intents.contains(&input.intent) {
        total += INTENT_WEIGHT;
        reasons.push(format!("intent {} (+{})", input.intent, INTENT_WEIGHT));
    }

    if input.preferred == Some(spec.name.as_str()) {
        total += PREFERRED_WEIGHT;
        reasons.push(format!("preferred (+{})", PREFERRED_WEIGHT));
    }

    for (keyword, re) in &op.keywords {
        if re.is_match(input.prompt) {
            total += KEYWORD_WEIGHT;
            reasons.push(format!("keyword '{}' (+{})", keyword, KEYWORD_WEIGHT));
        }
    }

    let present = spec.required_args.len() - missing_args.len();
    if present > 0 {
        total += ARG_PRESENT_WEIGHT * present as i64;
        reasons.push(format!("{} required argument(s) present", present));
    }
    if !missing_args.is_empty() {
        total -= ARG_MISSING_PENALTY * missing_args.len() as i64;
        reasons.push(format!("missing {}", missing_args.join(", ")));
    }

    RoutingCandidate {
        operation: spec.name.clone(),
        score: Some(total),
        reasons,
        missing_args,
    }
}

/// Index of the highest-scoring candidate.
///
/// Ties go to the earliest candidate. Excluded candidates never win.
pub fn best(candidates: &[RoutingCandidate]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let Some(score) = candidate.score else {
            continue;
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input<'a>(prompt: &'a str, arguments: &'a Value, intent: Intent) -> ScoreInput<'a> {
        ScoreInput {
            prompt,
            arguments,
            intent,
            preferred: None,
            allow_mutations: true,
        }
    }

    fn op() -> ScoredOperation {
        ScoredOperation::new(
            OperationSpec::new("read_data", &[Intent::DataRead])
                .keywords(&["rows", "show"])
                .requires(&["table", "limit"])
                .base(1),
        )
    }

    #[test]
    fn test_score_formula() {
        let args = json!({"table": "orders"});
        let c = score(&op(), &input("show rows", &args, Intent::DataRead));
        // 1 + 5 + 2 + 2 + 1 - 1
        assert_eq!(c.score, Some(10));
        assert_eq!(c.missing_args, vec!["limit".to_string()]);
    }

    #[test]
    fn test_preferred_bonus() {
        let args = json!({});
        let mut i = input("anything", &args, Intent::Metadata);
        let plain = score(&op(), &i).score.unwrap();
        i.preferred = Some("read_data");
        assert_eq!(score(&op(), &i).score.unwrap(), plain + 3);
    }

    #[test]
    fn test_blank_argument_is_missing() {
        assert!(!has_argument(&json!({"table": "  "}), "table"));
        assert!(!has_argument(&json!({"table": null}), "table"));
        assert!(has_argument(&json!({"table": 0}), "table"));
    }

    #[test]
    fn test_mutations_disabled_excludes() {
        let write = ScoredOperation::new(
            OperationSpec::new("delete_data", &[Intent::DataWrite]).mutating(),
        );
        let args = json!({});
        let mut i = input("delete", &args, Intent::DataWrite);
        i.allow_mutations = false;
        assert_eq!(score(&write, &i).score, None);
    }

    #[test]
    fn test_best_is_stable_and_skips_excluded() {
        let c = |name: &str, score: Option<i64>| RoutingCandidate {
            operation: name.to_string(),
            score,
            reasons: Vec::new(),
            missing_args: Vec::new(),
        };
        let candidates = [c("a", None), c("b", Some(4)), c("c", Some(4)), c("d", Some(2))];
        assert_eq!(best(&candidates), Some(1));
        assert_eq!(best(&[c("a", None)]), None);
    }
}
