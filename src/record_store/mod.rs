mod schema;
mod store;

pub use schema::RECORD_STORE_VERSIONED_SCHEMAS;
pub use store::{RecordBatch, RecordStore, SqliteRecordStore};
