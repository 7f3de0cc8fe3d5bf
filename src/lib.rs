//! Wax Config Library
//!
//! Schema editor for a recordings database: genre key lists, the two stores
//! that follow them, and snapshot undo over the metadata tree.

pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod editor;
pub mod error;
pub mod evolution;
pub mod genre_schema;
pub mod projection;
pub mod record_store;
pub mod settings;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog::DatabasePaths;
pub use config::{AppConfig, CliConfig, FileConfig};
pub use editor::{Editor, EditorOptions};
pub use error::EditError;
pub use evolution::{KeyClass, SchemaEdit};
