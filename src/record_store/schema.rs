//! SQLite schema of the long store.
//!
//! Each row holds one recording serialized as JSON, keyed by its uuid.

use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

pub const RECORDINGS_TABLE: Table = Table {
    name: "recordings",
    columns: &[
        Column::new("uuid", SqlType::Text).primary_key(),
        Column::new("body", SqlType::Text).not_null(),
    ],
};

pub const RECORD_STORE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[RECORDINGS_TABLE],
    migration: None,
}];
