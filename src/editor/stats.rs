//! Read-only statistics over the catalogue.

use super::Editor;
use crate::catalog::{Recording, ValueGroup};
use crate::projection::ProjectionStore;
use crate::record_store::{RecordStore, SqliteRecordStore};
use anyhow::Result;
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::debug;

/// Format of the `date played` and `date created` properties.
pub const PROP_DATE_FORMAT: &str = "%Y %b %d";
pub const DATE_PLAYED: &str = "date played";
pub const DATE_CREATED: &str = "date created";
pub const TIMES_PLAYED: &str = "times played";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreCount {
    pub genre: String,
    pub works: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSummary {
    pub genre: String,
    /// Long primary values, one line per key.
    pub description: String,
    pub date_played: Option<NaiveDate>,
    pub date_created: Option<NaiveDate>,
    pub times_played: u32,
}

fn first_name(value: Option<&ValueGroup>) -> Option<&str> {
    value
        .and_then(|group| group.names().first())
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}

fn parse_date(recording: &Recording, prop: &str) -> Option<NaiveDate> {
    let text = first_name(recording.prop(prop))?;
    match NaiveDate::parse_from_str(text, PROP_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            debug!(
                "Ignoring {} {:?} of {}: {}",
                prop, text, recording.uuid, err
            );
            None
        }
    }
}

impl Editor {
    /// Projection records per genre, most works first.
    pub fn works_per_genre(&self) -> Result<Vec<GenreCount>> {
        let projection = ProjectionStore::new(self.paths.short_dir());
        let mut counts = Vec::new();
        for genre in self.genres() {
            if projection.exists(&genre) {
                let works = projection.count(&genre)?;
                counts.push(GenreCount { genre, works });
            }
        }
        counts.sort_by_key(|count| Reverse(count.works));
        Ok(counts)
    }

    pub fn recordings_count(&self) -> Result<usize> {
        SqliteRecordStore::open(self.paths.long_store())?.len()
    }

    /// One summary per work, in recording order.
    pub fn work_summaries(&self) -> Result<Vec<WorkSummary>> {
        let store = SqliteRecordStore::open(self.paths.long_store())?;
        let settings = self.settings.get();
        let mut summaries = Vec::new();
        for uuid in store.uuids()? {
            let Some(recording) = store.get(&uuid)? else {
                continue;
            };
            let date_played = parse_date(&recording, DATE_PLAYED);
            let date_created = parse_date(&recording, DATE_CREATED);
            let times_played = first_name(recording.prop(TIMES_PLAYED))
                .and_then(|text| text.parse().ok())
                .unwrap_or(0);
            for work in recording.works.values() {
                let primary = settings
                    .genre(&work.genre)
                    .map(|entry| entry.keys.primary.len())
                    .unwrap_or(work.metadata.len());
                let description = work
                    .metadata
                    .iter()
                    .take(primary)
                    .map(|group| group.names().join(", "))
                    .collect::<Vec<_>>()
                    .join("\n");
                summaries.push(WorkSummary {
                    genre: work.genre.clone(),
                    description,
                    date_played,
                    date_created,
                    times_played,
                });
            }
        }
        Ok(summaries)
    }

    pub fn recently_played(&self, n: usize) -> Result<Vec<WorkSummary>> {
        let mut summaries = self.work_summaries()?;
        summaries.sort_by_key(|s| Reverse(s.date_played));
        summaries.truncate(n);
        Ok(summaries)
    }

    pub fn recently_created(&self, n: usize) -> Result<Vec<WorkSummary>> {
        let mut summaries = self.work_summaries()?;
        summaries.sort_by_key(|s| Reverse(s.date_created));
        summaries.truncate(n);
        Ok(summaries)
    }

    pub fn most_played(&self, n: usize) -> Result<Vec<WorkSummary>> {
        let mut summaries = self.work_summaries()?;
        summaries.sort_by_key(|s| Reverse(s.times_played));
        summaries.truncate(n);
        Ok(summaries)
    }
}
