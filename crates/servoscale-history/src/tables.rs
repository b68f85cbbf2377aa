//! redb table definitions for the history store.

use redb::TableDefinition;

/// Per-task result lists keyed by `{task_name}_recomment_results`.
/// Values are JSON arrays of serialized result entries, newest first.
pub const RESULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("recommend_results");
