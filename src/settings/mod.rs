//! The configuration service: a single JSON blob under the metadata tree,
//! rewritten in full on every change.

mod models;
mod service;

pub use models::*;
pub use service::SettingsService;
