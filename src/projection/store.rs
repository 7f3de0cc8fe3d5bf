use super::ShortRecord;
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub struct ProjectionStore {
    dir: PathBuf,
}

impl ProjectionStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ProjectionStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, genre: &str) -> PathBuf {
        self.dir.join(genre)
    }

    pub fn exists(&self, genre: &str) -> bool {
        self.path(genre).is_file()
    }

    /// Genres that have a projection file, sorted by name. Hidden files,
    /// such as abandoned rewrites, are skipped.
    pub fn genres(&self) -> Result<Vec<String>> {
        let mut genres = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                genres.push(name);
            }
        }
        genres.sort();
        Ok(genres)
    }

    pub fn create_empty(&self, genre: &str) -> Result<()> {
        let path = self.path(genre);
        File::create(&path)
            .with_context(|| format!("Failed to create projection {}", path.display()))?;
        Ok(())
    }

    pub fn remove(&self, genre: &str) -> Result<()> {
        let path = self.path(genre);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove projection {}", path.display()))?;
        }
        Ok(())
    }

    pub fn rename(&self, old_genre: &str, new_genre: &str) -> Result<()> {
        let to = self.path(new_genre);
        if to.exists() {
            bail!("Projection for {} already exists", new_genre);
        }
        fs::rename(self.path(old_genre), &to)
            .with_context(|| format!("Failed to rename projection {} to {}", old_genre, new_genre))?;
        Ok(())
    }

    /// Reads every record of a genre. A missing file reads as empty.
    pub fn read(&self, genre: &str) -> Result<Vec<ShortRecord>> {
        self.stream(genre)?.collect()
    }

    fn stream(&self, genre: &str) -> Result<Box<dyn Iterator<Item = Result<ShortRecord>>>> {
        let path = self.path(genre);
        if !path.exists() {
            debug!("No projection file for {}", genre);
            return Ok(Box::new(std::iter::empty()));
        }
        let file = File::open(&path)
            .with_context(|| format!("Failed to open projection {}", path.display()))?;
        let records = BufReader::new(file)
            .lines()
            .enumerate()
            .filter(|(_, line)| !matches!(line, Ok(line) if line.trim().is_empty()))
            .map(move |(line_index, line)| -> Result<ShortRecord> {
                let line = line?;
                serde_json::from_str(&line).with_context(|| {
                    format!("Malformed record at {}:{}", path.display(), line_index + 1)
                })
            });
        Ok(Box::new(records))
    }

    pub fn count(&self, genre: &str) -> Result<usize> {
        Ok(self.read(genre)?.len())
    }

    /// Replaces the whole projection of a genre.
    pub fn write(&self, genre: &str, records: &[ShortRecord]) -> Result<()> {
        let mut staged = self.new_stage(genre)?;
        for record in records {
            staged.append(record)?;
        }
        staged.finish()?.commit()
    }

    /// Streams the projection of `genre` through `rewrite` into a temporary
    /// file next to the original. The original is untouched until
    /// [`StagedRewrite::commit`] is called.
    ///
    /// `rewrite` returns the replacement record, or `None` to drop it.
    pub fn stage_rewrite<F>(&self, genre: &str, mut rewrite: F) -> Result<StagedRewrite>
    where
        F: FnMut(ShortRecord) -> Result<Option<ShortRecord>>,
    {
        let mut staged = self.new_stage(genre)?;
        let mut total = 0;
        for record in self.stream(genre)? {
            total += 1;
            if let Some(replacement) = rewrite(record?)? {
                staged.append(&replacement)?;
            }
        }
        let staged = staged.finish()?;
        debug!(
            "Staged rewrite of {}: {} of {} records kept",
            genre, staged.kept, total
        );
        Ok(staged)
    }

    fn new_stage(&self, genre: &str) -> Result<StageWriter> {
        let temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .with_context(|| format!("Failed to create temporary file in {}", self.dir.display()))?;
        Ok(StageWriter {
            genre: genre.to_string(),
            target: self.path(genre),
            writer: BufWriter::new(temp),
            kept: 0,
        })
    }
}

struct StageWriter {
    genre: String,
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
    kept: usize,
}

impl StageWriter {
    fn append(&mut self, record: &ShortRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.kept += 1;
        Ok(())
    }

    fn finish(self) -> Result<StagedRewrite> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|err| err.into_error())
            .context("Failed to flush staged projection")?;
        temp.as_file()
            .sync_all()
            .context("Failed to sync staged projection")?;
        Ok(StagedRewrite {
            genre: self.genre,
            target: self.target,
            temp,
            kept: self.kept,
        })
    }
}

/// A fully written replacement projection waiting to be committed.
pub struct StagedRewrite {
    genre: String,
    target: PathBuf,
    temp: NamedTempFile,
    kept: usize,
}

impl StagedRewrite {
    pub fn kept(&self) -> usize {
        self.kept
    }

    /// Atomically replaces the original projection.
    pub fn commit(self) -> Result<()> {
        self.temp
            .persist(&self.target)
            .with_context(|| format!("Failed to replace projection of {}", self.genre))?;
        info!("Rewrote projection of {} with {} records", self.genre, self.kept);
        Ok(())
    }

    /// Drops the replacement, leaving the original untouched.
    pub fn discard(self) {
        debug!("Discarded staged projection of {}", self.genre);
    }
}
