//! Schema evolution: structural key edits applied to the record store and
//! the per-genre projection together.

mod edit;
mod engine;
mod fields;

pub use edit::{KeyClass, KeyDefaults, KeyMove, SchemaEdit};
pub use engine::{rewrite_record, RewriteSummary, SchemaEvolutionEngine};
pub use fields::{Field, KeyedFields};
