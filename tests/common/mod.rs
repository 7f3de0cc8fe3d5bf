//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestDatabase, JAZZ};
//!
//! #[test]
//! fn test_keys() {
//!     let db = TestDatabase::create();
//!     let editor = db.open_editor();
//!     assert_eq!(editor.keys(JAZZ).unwrap().primary, vec!["composer", "title"]);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::TestDatabase;
