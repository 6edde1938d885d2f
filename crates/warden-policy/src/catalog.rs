//! Static tool classification.
//!
//! Names listed here are classified regardless of what the tool itself
//! declares; declared capabilities can only add restrictions.

use warden_core::ToolCapabilities;

/// Operations that write rows or change schema.
pub const MUTATING_TOOLS: &[&str] = &[
    "insert_data",
    "update_data",
    "delete_data",
    "bulk_insert",
    "execute_procedure",
    "create_table",
    "alter_table",
    "drop_table",
    "truncate_table",
    "create_index",
    "drop_index",
];

/// Catalog-only operations that never need approval.
pub const METADATA_EXEMPT_TOOLS: &[&str] = &[
    "list_environments",
    "list_databases",
    "list_schemas",
    "list_tables",
    "list_views",
    "list_indexes",
    "list_stored_procedures",
    "describe_table",
    "get_table_relationships",
    "get_server_info",
];

/// Whether a tool writes anything.
pub fn is_mutating(tool: &str, capabilities: &ToolCapabilities) -> bool {
    MUTATING_TOOLS.contains(&tool) || capabilities.is_mutating()
}

/// Whether a tool skips the approval gate. A mutating tool never does.
pub fn is_metadata_exempt(tool: &str, capabilities: &ToolCapabilities) -> bool {
    if is_mutating(tool, capabilities) {
        return false;
    }
    METADATA_EXEMPT_TOOLS.contains(&tool) || capabilities.metadata_exempt
}
