//! Snapshot-based undo.
//!
//! Checkpoints live in `.checkpoints/1..N`, each a full copy of the
//! metadata tree at push time with the undo description in `.comment`.
//! The stack is LIFO: popping slot N restores the tree it holds and exposes
//! the comment of slot N-1.

mod comment;

pub use comment::{plain_comment, CommentBuilder};

use crate::catalog::DatabasePaths;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const COMMENT_FILE: &str = ".comment";
const STAGING_DIR: &str = ".staging";
const DISCARDED_DIR: &str = ".discarded";

pub struct CheckpointManager {
    metadata: PathBuf,
    checkpoints: PathBuf,
}

impl CheckpointManager {
    pub fn new<M: AsRef<Path>, C: AsRef<Path>>(metadata: M, checkpoints: C) -> Self {
        CheckpointManager {
            metadata: metadata.as_ref().to_path_buf(),
            checkpoints: checkpoints.as_ref().to_path_buf(),
        }
    }

    pub fn for_database(paths: &DatabasePaths) -> Self {
        Self::new(paths.metadata(), paths.checkpoints())
    }

    fn slot(&self, n: usize) -> PathBuf {
        self.checkpoints.join(n.to_string())
    }

    /// Number of checkpoints on the stack.
    pub fn depth(&self) -> Result<usize> {
        if !self.checkpoints.is_dir() {
            return Ok(0);
        }
        let mut slots = Vec::new();
        for entry in fs::read_dir(&self.checkpoints)
            .with_context(|| format!("Failed to list {}", self.checkpoints.display()))?
        {
            let entry = entry?;
            if let Ok(n) = entry.file_name().to_string_lossy().parse::<usize>() {
                slots.push(n);
            }
        }
        slots.sort_unstable();
        if slots.iter().enumerate().any(|(i, &n)| n != i + 1) {
            bail!(
                "Checkpoint stack in {} is not contiguous: {:?}",
                self.checkpoints.display(),
                slots
            );
        }
        Ok(slots.len())
    }

    /// Copies the live metadata tree into slot N+1 and returns N+1.
    ///
    /// The copy is staged in a hidden directory and renamed into place, so an
    /// interrupted push never leaves a numbered slot behind.
    pub fn push(&self, comment: &str) -> Result<usize> {
        fs::create_dir_all(&self.checkpoints)
            .with_context(|| format!("Failed to create {}", self.checkpoints.display()))?;
        let n = self.depth()? + 1;

        let staging = self.checkpoints.join(STAGING_DIR);
        if staging.exists() {
            warn!("Removing leftover checkpoint staging directory");
            fs::remove_dir_all(&staging)?;
        }
        copy_tree(&self.metadata, &staging)?;
        fs::write(staging.join(COMMENT_FILE), comment)
            .context("Failed to write checkpoint comment")?;
        fs::rename(&staging, self.slot(n))
            .with_context(|| format!("Failed to create checkpoint {}", n))?;

        info!("Pushed checkpoint {}", n);
        Ok(n)
    }

    /// Restores the metadata tree from the top slot and returns the comment
    /// of the new top, or an empty string when the stack is now empty.
    /// Popping an empty stack does nothing.
    pub fn pop(&self) -> Result<String> {
        let n = self.depth()?;
        if n == 0 {
            warn!("Pop requested on an empty checkpoint stack");
            return Ok(String::new());
        }

        self.swap_in(&self.slot(n))
            .with_context(|| format!("Failed to restore checkpoint {}", n))?;

        info!("Popped checkpoint {}", n);
        self.peek_comment()
    }

    /// Replaces the live metadata tree with `source`. The live tree is moved
    /// aside first and moved back if `source` cannot take its place.
    fn swap_in(&self, source: &Path) -> Result<()> {
        self.recover_discarded()?;
        let discarded = self.checkpoints.join(DISCARDED_DIR);
        if self.metadata.exists() {
            fs::rename(&self.metadata, &discarded)
                .context("Failed to move the live metadata tree aside")?;
        }
        if let Err(err) = fs::rename(source, &self.metadata) {
            if discarded.exists() {
                fs::rename(&discarded, &self.metadata)
                    .context("Failed to put the live metadata tree back")?;
            }
            return Err(err)
                .with_context(|| format!("Failed to move {} into place", source.display()));
        }

        let comment_file = self.metadata.join(COMMENT_FILE);
        if comment_file.exists() {
            fs::remove_file(&comment_file)?;
        }
        if discarded.exists() {
            fs::remove_dir_all(&discarded)
                .context("Failed to remove the replaced metadata tree")?;
        }
        Ok(())
    }

    /// Deals with a tree moved aside by an interrupted pop. It goes back in
    /// place when the live tree is missing and is deleted otherwise.
    fn recover_discarded(&self) -> Result<()> {
        let discarded = self.checkpoints.join(DISCARDED_DIR);
        if !discarded.exists() {
            return Ok(());
        }
        if self.metadata.exists() {
            debug!("Removing leftover discarded metadata tree");
            fs::remove_dir_all(&discarded)?;
        } else {
            warn!("Live metadata tree is missing, restoring the discarded one");
            fs::rename(&discarded, &self.metadata)
                .context("Failed to restore the discarded metadata tree")?;
        }
        Ok(())
    }

    /// Deletes every checkpoint.
    pub fn clear(&self) -> Result<()> {
        self.recover_discarded()?;
        if self.checkpoints.is_dir() {
            fs::remove_dir_all(&self.checkpoints)
                .with_context(|| format!("Failed to remove {}", self.checkpoints.display()))?;
        }
        fs::create_dir_all(&self.checkpoints)?;
        debug!("Cleared checkpoint stack");
        Ok(())
    }

    /// Comment of the top slot, or an empty string for an empty stack.
    pub fn peek_comment(&self) -> Result<String> {
        if !self.checkpoints.is_dir() {
            fs::create_dir_all(&self.checkpoints)?;
            return Ok(String::new());
        }
        match self.depth()? {
            0 => Ok(String::new()),
            n => {
                let path = self.slot(n).join(COMMENT_FILE);
                if !path.exists() {
                    return Ok(String::new());
                }
                fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))
            }
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", from.display()))?;
        let relative = entry.path().strip_prefix(from)?;
        let target = to.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} into checkpoint", entry.path().display())
            })?;
        } else {
            debug!("Skipping {} in checkpoint copy", entry.path().display());
        }
    }
    Ok(())
}
