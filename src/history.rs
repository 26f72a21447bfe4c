//! Bounded log of previously accepted answers.
//!
//! Persistence is best effort: every read or write failure degrades to an
//! empty history instead of failing the run. There is no locking, so two
//! concurrent runs race and the last writer wins.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait HistoryStore {
    /// Up to `max_items` most recent entries, oldest first.
    fn load(&self, max_items: usize) -> Vec<String>;

    /// Adds `entry` at the end and keeps only the most recent `max_items`.
    fn append(&self, entry: &str, max_items: usize);
}

fn tail(mut entries: Vec<String>, max_items: usize) -> Vec<String> {
    let start = entries.len().saturating_sub(max_items);
    entries.drain(..start);
    entries
}

/// Collapses whitespace so an entry always fits on one line.
pub fn normalize_entry(entry: &str) -> String {
    entry.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Vec<String> {
        match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(err) => {
                debug!(
                    path = %self.path.display(),
                    error = %err,
                    "history unavailable; starting empty"
                );
                Vec::new()
            }
        }
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self, max_items: usize) -> Vec<String> {
        tail(self.read_all(), max_items)
    }

    fn append(&self, entry: &str, max_items: usize) {
        let entry = normalize_entry(entry);
        if entry.is_empty() {
            return;
        }

        let mut entries = self.read_all();
        entries.push(entry);
        let entries = tail(entries, max_items);

        let mut contents = entries.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        if let Err(err) = fs::write(&self.path, contents) {
            warn!(
                path = %self.path.display(),
                error = %err,
                "failed to persist answer history"
            );
        }
    }
}

/// Process-local history, used when nothing should touch the filesystem.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: RefCell<Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: RefCell::new(entries.into_iter().map(Into::into).collect()),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self, max_items: usize) -> Vec<String> {
        tail(self.entries.borrow().clone(), max_items)
    }

    fn append(&self, entry: &str, max_items: usize) {
        let entry = normalize_entry(entry);
        if entry.is_empty() {
            return;
        }
        let mut entries = self.entries.borrow_mut();
        entries.push(entry);
        let kept = tail(std::mem::take(&mut *entries), max_items);
        *entries = kept;
    }
}
