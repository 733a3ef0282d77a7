//! Processed-post ledger.
//!
//! The ledger records the id of every post the pipeline has dispatched so
//! a post is acted on at most once across restarts. It is loaded once at
//! startup and rewritten in full after every cycle. A missing or corrupt
//! snapshot reads as empty — a stale disk must never prevent startup, at
//! the documented cost of possibly re-notifying posts processed right
//! before a crash.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// In-memory set of post ids that have already been dispatched.
///
/// Ids are only ever added. The cycle runner owns the ledger for the
/// duration of a cycle, so no locking is needed.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    ids: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a post id as processed. Returns false if it was already marked.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for Ledger {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Durable storage for the ledger: a single file holding a JSON array of
/// post id strings.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger from disk.
    ///
    /// Never fails the caller: a missing file means a fresh start, and a
    /// snapshot that does not parse is treated the same way.
    pub fn load(&self) -> Ledger {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!(
                    "No ledger snapshot at {} ({}). Starting fresh.",
                    self.path.display(),
                    e
                );
                return Ledger::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&data) {
            Ok(ids) => {
                let ledger: Ledger = ids.into_iter().collect();
                debug!(
                    "Loaded {} processed post ids from {}",
                    ledger.len(),
                    self.path.display()
                );
                ledger
            }
            Err(e) => {
                warn!(
                    "Ledger snapshot at {} is malformed ({}). Starting fresh.",
                    self.path.display(),
                    e
                );
                Ledger::new()
            }
        }
    }

    /// Overwrite the on-disk snapshot with the full ledger contents.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let ids: Vec<&String> = ledger.ids.iter().collect();
        let data = serde_json::to_string(&ids).context("failed to serialize ledger")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write ledger to {}", self.path.display()))?;
        debug!("Saved {} processed post ids", ids.len());
        Ok(())
    }
}
