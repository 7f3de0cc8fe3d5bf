mod abbreviation;
mod models;
mod paths;

pub use abbreviation::{abbreviate, abbreviate_group};
pub use models::*;
pub use paths::{DatabasePaths, MEDIA_DIRS};
