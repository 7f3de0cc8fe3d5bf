use super::edit::{KeyDefaults, SchemaEdit};
use crate::catalog::DatabasePaths;
use crate::projection::{ProjectionStore, ShortRecord};
use crate::record_store::{RecordStore, SqliteRecordStore};
use crate::settings::GenreKeys;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    pub works: usize,
    pub projection_replaced: bool,
}

/// Applies one edit to a single projection record and the work it points
/// to. Returns the record's replacement.
pub fn rewrite_record<S: RecordStore>(
    store: &mut S,
    genre: &str,
    keys_before: &GenreKeys,
    edit: &SchemaEdit,
    defaults: &KeyDefaults,
    record: ShortRecord,
) -> Result<Option<ShortRecord>> {
    let mut recording = store
        .get(&record.uuid)?
        .with_context(|| format!("Projection of {} references missing recording {}", genre, record.uuid))?;
    let work = recording.works.get_mut(&record.work).with_context(|| {
        format!(
            "Projection of {} references missing work {} of {}",
            genre, record.work, record.uuid
        )
    })?;
    if work.genre != genre {
        bail!(
            "Work {} of {} belongs to {}, not {}",
            record.work,
            record.uuid,
            work.genre,
            genre
        );
    }
    let short = edit.apply_to_work(keys_before, work, &record.metadata, defaults)?;
    store.put(&recording)?;
    Ok(Some(ShortRecord {
        metadata: short,
        ..record
    }))
}

/// Rewrites the record store and the projection of a genre in lockstep.
pub struct SchemaEvolutionEngine<'a> {
    paths: &'a DatabasePaths,
    defaults: &'a KeyDefaults,
}

impl<'a> SchemaEvolutionEngine<'a> {
    pub fn new(paths: &'a DatabasePaths, defaults: &'a KeyDefaults) -> Self {
        SchemaEvolutionEngine { paths, defaults }
    }

    /// Runs `edit` over every work of `genre`, whose key lists before the
    /// edit are `keys_before`.
    ///
    /// Record changes accumulate in one transaction and the projection is
    /// staged in a temporary file. Nothing is committed unless every record
    /// was rewritten; then the transaction commits and, if the edit changes
    /// the projection, the staged file replaces the original. Two records
    /// pointing at the same work abort the edit.
    pub fn apply(
        &self,
        genre: &str,
        keys_before: &GenreKeys,
        edit: &SchemaEdit,
    ) -> Result<RewriteSummary> {
        debug!("Applying {} to genre {}", edit.name(), genre);
        let mut store = SqliteRecordStore::open(self.paths.long_store())?;
        let projection = ProjectionStore::new(self.paths.short_dir());

        let mut batch = store.begin()?;
        let mut works = 0;
        let mut visited = HashSet::new();
        let staged = projection.stage_rewrite(genre, |record| {
            if !visited.insert((record.uuid.clone(), record.work)) {
                bail!(
                    "Projection of {} lists work {} of {} more than once",
                    genre,
                    record.work,
                    record.uuid
                );
            }
            works += 1;
            rewrite_record(&mut batch, genre, keys_before, edit, self.defaults, record)
        })?;
        batch.commit()?;

        let projection_replaced = edit.touches_projection(keys_before);
        if projection_replaced {
            staged.commit()?;
        } else {
            staged.discard();
        }

        info!(
            "Applied {} to {} works of genre {}",
            edit.name(),
            works,
            genre
        );
        Ok(RewriteSummary {
            works,
            projection_replaced,
        })
    }
}
