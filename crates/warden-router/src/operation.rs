//! Routing metadata for operations.
//!
//! An [`OperationSpec`] describes how prompts find an operation. It carries
//! no behaviour; the matching [`Tool`](warden_policy::Tool) registered under
//! the same name does the work.

use serde::{Deserialize, Serialize};

use crate::intent::Intent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Must equal the registered tool's name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Intents this operation serves.
    #[serde(default)]
    pub intents: Vec<Intent>,

    /// Words or phrases that suggest this operation.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Arguments the operation cannot run without.
    #[serde(default)]
    pub required_args: Vec<String>,

    #[serde(default)]
    pub base_score: i64,

    #[serde(default)]
    pub mutates_data: bool,

    #[serde(default)]
    pub schema_change: bool,

    /// Always ask for `confirm_intent`, even for reads.
    #[serde(default)]
    pub requires_confirmation: bool,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, intents: &[Intent]) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            intents: intents.to_vec(),
            keywords: Vec::new(),
            required_args: Vec::new(),
            base_score: 0,
            mutates_data: false,
            schema_change: false,
            requires_confirmation: false,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn requires(mut self, args: &[&str]) -> Self {
        self.required_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn base(mut self, score: i64) -> Self {
        self.base_score = score;
        self
    }

    pub fn mutating(mut self) -> Self {
        self.mutates_data = true;
        self
    }

    pub fn changes_schema(mut self) -> Self {
        self.schema_change = true;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    /// Whether routing to this operation needs `confirm_intent`.
    pub fn needs_confirmation(&self) -> bool {
        self.mutates_data || self.schema_change || self.requires_confirmation
    }
}

/// The built-in operations, in registration order.
pub fn default_catalog() -> Vec<OperationSpec> {
    use Intent::*;

    vec![
        // Reads
        OperationSpec::new("read_data", &[DataRead])
            .describe("Read rows from a table")
            .keywords(&["rows", "records", "show", "read", "get", "fetch", "latest", "top"])
            .requires(&["table"])
            .base(1),
        OperationSpec::new("execute_query", &[DataRead])
            .describe("Run a read-only SQL query")
            .keywords(&["query", "sql", "select", "run", "execute"])
            .requires(&["query"]),
        OperationSpec::new("count_rows", &[DataRead])
            .describe("Count rows in a table")
            .keywords(&["count", "how many", "number of"])
            .requires(&["table"]),
        OperationSpec::new("profile_table", &[DataRead, SchemaDiscovery])
            .describe("Summarise column statistics of a table")
            .keywords(&["profile", "statistics", "stats", "distribution", "nulls"])
            .requires(&["table"]),
        OperationSpec::new("explain_query", &[DataRead])
            .describe("Show the execution plan of a query")
            .keywords(&["explain", "plan", "execution plan", "slow"])
            .requires(&["query"]),
        // Schema discovery
        OperationSpec::new("list_tables", &[SchemaDiscovery])
            .describe("List tables")
            .keywords(&["tables", "list tables", "show tables"])
            .base(1),
        OperationSpec::new("list_schemas", &[SchemaDiscovery])
            .describe("List schemas")
            .keywords(&["schemas", "namespaces"]),
        OperationSpec::new("describe_table", &[SchemaDiscovery])
            .describe("Describe the columns of a table")
            .keywords(&["describe", "columns", "structure", "definition"])
            .requires(&["table"]),
        OperationSpec::new("get_table_relationships", &[SchemaDiscovery])
            .describe("Show foreign keys between tables")
            .keywords(&["relationships", "foreign key", "foreign keys", "references"]),
        OperationSpec::new("list_views", &[SchemaDiscovery])
            .describe("List views")
            .keywords(&["views"]),
        // Metadata
        OperationSpec::new("list_indexes", &[Metadata, SchemaDiscovery])
            .describe("List indexes")
            .keywords(&["indexes", "indices"]),
        OperationSpec::new("list_databases", &[Metadata])
            .describe("List databases on the server")
            .keywords(&["databases"]),
        OperationSpec::new("list_stored_procedures", &[Metadata])
            .describe("List stored procedures")
            .keywords(&["procedures", "stored procedures", "functions"]),
        OperationSpec::new("get_server_info", &[Metadata])
            .describe("Show server version and settings")
            .keywords(&["server info", "version", "server version"]),
        // Writes
        OperationSpec::new("insert_data", &[DataWrite])
            .describe("Insert rows into a table")
            .keywords(&["insert", "add row", "add a row", "new row"])
            .requires(&["table", "values"])
            .mutating(),
        OperationSpec::new("update_data", &[DataWrite])
            .describe("Update rows matching a filter")
            .keywords(&["update", "modify", "change", "set"])
            .requires(&["table", "values", "where"])
            .mutating(),
        OperationSpec::new("delete_data", &[DataWrite])
            .describe("Delete rows matching a filter")
            .keywords(&["delete", "remove"])
            .requires(&["table", "where"])
            .mutating(),
        // Schema changes
        OperationSpec::new("create_table", &[SchemaChange])
            .describe("Create a table")
            .keywords(&["create table", "new table"])
            .requires(&["table", "columns"])
            .changes_schema(),
        OperationSpec::new("alter_table", &[SchemaChange])
            .describe("Alter the columns of a table")
            .keywords(&["alter table", "add column", "drop column", "rename column"])
            .requires(&["table"])
            .changes_schema(),
        OperationSpec::new("drop_table", &[SchemaChange])
            .describe("Drop a table")
            .keywords(&["drop table", "truncate"])
            .requires(&["table"])
            .changes_schema()
            .confirmed(),
        OperationSpec::new("create_index", &[SchemaChange])
            .describe("Create an index")
            .keywords(&["create index", "add index"])
            .requires(&["table", "columns"])
            .changes_schema(),
    ]
}
