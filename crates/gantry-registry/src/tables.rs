//! redb table definitions for the gantry registry.
//!
//! One table, `&str` keys and `&[u8]` values (JSON-serialized records).
//! Keys are the normalized application slug; deployment history is
//! embedded in the record so the append-and-trim bound stays atomic.

use redb::TableDefinition;

/// Application records keyed by `{app_slug}`.
pub const APPS: TableDefinition<&str, &[u8]> = TableDefinition::new("apps");
