mod versioned_schema;

pub use versioned_schema::*;

/// Offset added to every schema version written to `PRAGMA user_version`, so
/// that a database never touched by this crate (user_version = 0) is told
/// apart from one at schema version 0.
pub const BASE_DB_VERSION: usize = 77000;
