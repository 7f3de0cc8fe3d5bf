//! The per-genre "short" projection.
//!
//! Each genre owns one file under `metadata/short/`, holding one JSON record
//! per line for every work of the genre, in write order. A record carries the
//! abbreviated values of the genre's primary keys only.

mod store;

pub use store::{ProjectionStore, StagedRewrite};

use crate::catalog::ValueGroup;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortRecord {
    /// Abbreviated values, aligned with the genre's primary keys.
    pub metadata: Vec<ValueGroup>,
    pub uuid: String,
    pub work: u32,
}

impl ShortRecord {
    pub fn new<S: Into<String>>(metadata: Vec<ValueGroup>, uuid: S, work: u32) -> Self {
        ShortRecord {
            metadata,
            uuid: uuid.into(),
            work,
        }
    }
}
