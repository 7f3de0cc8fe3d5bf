//! SQLite-backed long store.

use super::schema::{RECORDINGS_TABLE, RECORD_STORE_VERSIONED_SCHEMAS};
use crate::catalog::Recording;
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use tracing::{debug, info};

/// Keyed access to recordings by uuid.
pub trait RecordStore {
    fn get(&self, uuid: &str) -> Result<Option<Recording>>;

    /// Inserts or replaces the recording stored under its uuid.
    fn put(&mut self, recording: &Recording) -> Result<()>;

    /// Returns whether a recording was removed.
    fn remove(&mut self, uuid: &str) -> Result<bool>;

    /// Every stored uuid, in ascending order.
    fn uuids(&self) -> Result<Vec<String>>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

// =============================================================================
// Shared statements
// =============================================================================

fn get_recording(conn: &Connection, uuid: &str) -> Result<Option<Recording>> {
    let body: Option<String> = conn
        .query_row(
            &format!("SELECT body FROM {} WHERE uuid = ?1", RECORDINGS_TABLE.name),
            params![uuid],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read recording {}", uuid))?;
    body.map(|body| {
        serde_json::from_str(&body).with_context(|| format!("Corrupted recording {}", uuid))
    })
    .transpose()
}

fn put_recording(conn: &Connection, recording: &Recording) -> Result<()> {
    let body = serde_json::to_string(recording)?;
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {} (uuid, body) VALUES (?1, ?2)",
            RECORDINGS_TABLE.name
        ),
        params![recording.uuid, body],
    )
    .with_context(|| format!("Failed to write recording {}", recording.uuid))?;
    Ok(())
}

fn remove_recording(conn: &Connection, uuid: &str) -> Result<bool> {
    let removed = conn
        .execute(
            &format!("DELETE FROM {} WHERE uuid = ?1", RECORDINGS_TABLE.name),
            params![uuid],
        )
        .with_context(|| format!("Failed to remove recording {}", uuid))?;
    Ok(removed > 0)
}

fn list_uuids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT uuid FROM {} ORDER BY uuid",
        RECORDINGS_TABLE.name
    ))?;
    let uuids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(uuids)
}

fn count_recordings(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", RECORDINGS_TABLE.name),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

// =============================================================================
// Store
// =============================================================================

/// The long store, opened for the duration of one edit.
///
/// Uses the default rollback journal so that the database is a single
/// self-contained file whenever the store is closed.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let mut conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open record store {}", db_path.display()))?;

        migrate_if_needed(&mut conn, RECORD_STORE_VERSIONED_SCHEMAS, "record store")?;

        #[cfg(not(feature = "no_checks"))]
        RECORD_STORE_VERSIONED_SCHEMAS[RECORD_STORE_VERSIONED_SCHEMAS.len() - 1]
            .validate(&conn)
            .context("Record store schema validation failed")?;

        debug!(
            "Opened record store {} with {} recordings",
            db_path.display(),
            count_recordings(&conn)?
        );
        Ok(SqliteRecordStore { conn })
    }

    /// Starts a batch of changes that only become visible on
    /// [`RecordBatch::commit`]. Dropping the batch discards them.
    pub fn begin(&mut self) -> Result<RecordBatch<'_>> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to start record store transaction")?;
        Ok(RecordBatch { tx, written: 0 })
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, uuid: &str) -> Result<Option<Recording>> {
        get_recording(&self.conn, uuid)
    }

    fn put(&mut self, recording: &Recording) -> Result<()> {
        put_recording(&self.conn, recording)
    }

    fn remove(&mut self, uuid: &str) -> Result<bool> {
        remove_recording(&self.conn, uuid)
    }

    fn uuids(&self) -> Result<Vec<String>> {
        list_uuids(&self.conn)
    }

    fn len(&self) -> Result<usize> {
        count_recordings(&self.conn)
    }
}

// =============================================================================
// Batch
// =============================================================================

pub struct RecordBatch<'a> {
    tx: Transaction<'a>,
    written: usize,
}

impl RecordBatch<'_> {
    pub fn commit(self) -> Result<()> {
        let written = self.written;
        self.tx
            .commit()
            .context("Failed to commit record store transaction")?;
        info!("Committed {} record store changes", written);
        Ok(())
    }
}

impl RecordStore for RecordBatch<'_> {
    fn get(&self, uuid: &str) -> Result<Option<Recording>> {
        get_recording(&self.tx, uuid)
    }

    fn put(&mut self, recording: &Recording) -> Result<()> {
        put_recording(&self.tx, recording)?;
        self.written += 1;
        Ok(())
    }

    fn remove(&mut self, uuid: &str) -> Result<bool> {
        let removed = remove_recording(&self.tx, uuid)?;
        if removed {
            self.written += 1;
        }
        Ok(removed)
    }

    fn uuids(&self) -> Result<Vec<String>> {
        list_uuids(&self.tx)
    }

    fn len(&self) -> Result<usize> {
        count_recordings(&self.tx)
    }
}
