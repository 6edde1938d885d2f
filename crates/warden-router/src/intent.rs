//! Coarse intent classification.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// What the caller wants to do, roughly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    DataRead,
    DataWrite,
    SchemaDiscovery,
    SchemaChange,
    Metadata,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DataRead => "data_read",
            Self::DataWrite => "data_write",
            Self::SchemaDiscovery => "schema_discovery",
            Self::SchemaChange => "schema_change",
            Self::Metadata => "metadata",
        };
        f.write_str(s)
    }
}

/// How an intent was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum IntentSource {
    Keyword(String),
    SqlVerb(String),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    #[serde(flatten)]
    pub source: IntentSource,
}

/// Detectors in priority order; the first keyword hit wins.
const DETECTORS: &[(Intent, &[&str])] = &[
    (
        Intent::SchemaChange,
        &[
            "create table",
            "alter table",
            "drop table",
            "truncate",
            "add column",
            "drop column",
            "rename column",
            "create index",
            "drop index",
        ],
    ),
    (
        Intent::DataWrite,
        &[
            "insert", "update", "delete", "remove", "modify", "upsert", "add row", "add a row",
        ],
    ),
    (
        Intent::Metadata,
        &[
            "databases",
            "server info",
            "server version",
            "version",
            "stored procedures",
            "procedures",
            "indexes",
            "environments",
        ],
    ),
    (
        Intent::SchemaDiscovery,
        &[
            "tables",
            "schemas",
            "schema",
            "columns",
            "describe",
            "structure",
            "relationships",
            "foreign key",
            "foreign keys",
            "views",
        ],
    ),
    (
        Intent::DataRead,
        &[
            "select", "show", "get", "read", "fetch", "find", "query", "count", "rows", "top",
        ],
    ),
];

/// Arguments that may carry raw SQL.
const SQL_ARGS: &[&str] = &["query", "sql"];

static COMPILED: LazyLock<Vec<(Intent, Vec<(&'static str, Regex)>)>> = LazyLock::new(|| {
    DETECTORS
        .iter()
        .map(|(intent, keywords)| {
            let compiled = keywords
                .iter()
                .filter_map(|kw| phrase_regex(kw).map(|re| (*kw, re)))
                .collect();
            (*intent, compiled)
        })
        .collect()
});

/// Case-insensitive whole-word match for a keyword or phrase.
///
/// Spaces in the phrase match any run of whitespace.
pub fn phrase_regex(phrase: &str) -> Option<Regex> {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    if body.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"\b{}\b", body))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Classify a prompt, falling back to the leading verb of a SQL argument.
pub fn classify(prompt: &str, arguments: &Value) -> Classification {
    for (intent, keywords) in COMPILED.iter() {
        if let Some((keyword, _)) = keywords.iter().find(|(_, re)| re.is_match(prompt)) {
            return Classification {
                intent: *intent,
                source: IntentSource::Keyword((*keyword).to_string()),
            };
        }
    }

    if let Some((verb, intent)) = SQL_ARGS
        .iter()
        .find_map(|key| arguments.get(*key).and_then(Value::as_str))
        .and_then(sql_verb)
    {
        return Classification {
            intent,
            source: IntentSource::SqlVerb(verb),
        };
    }

    Classification {
        intent: Intent::DataRead,
        source: IntentSource::Default,
    }
}

/// Map the leading SQL verb of `sql` to an intent.
fn sql_verb(sql: &str) -> Option<(String, Intent)> {
    let verb = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()?
        .to_lowercase();

    let intent = match verb.as_str() {
        "select" | "with" => Intent::DataRead,
        "insert" | "update" | "delete" | "merge" => Intent::DataWrite,
        "create" | "alter" | "drop" | "truncate" => Intent::SchemaChange,
        _ => return None,
    };
    Some((verb, intent))
}
