//! Bounded local persistence of finished answers.
//!
//! A capped, most-recent-first list of past question/answer records under a
//! single namespaced file. Persistence is best-effort: a failed write is
//! logged and the in-memory list still updates, so quota or permission
//! problems never become fatal.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ENTRIES: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_entries: usize,
}

impl HistoryConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// One saved question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    /// Source document ids cited in the answer.
    #[serde(default)]
    pub cited_ids: Vec<String>,
    pub saved_at_ms: u64,
}

impl HistoryEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, cited_ids: Vec<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            cited_ids,
            saved_at_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Most-recent-first store of past answers.
pub struct HistoryStore {
    config: HistoryConfig,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Open the store, tolerating a missing or corrupt file by starting
    /// empty.
    pub fn open(config: HistoryConfig) -> Self {
        let entries = match load(&config) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!(
                    "history at {} could not be loaded, starting empty: {err:#}",
                    config.path.display()
                );
                Vec::new()
            }
        };
        Self { config, entries }
    }

    /// Prepend an entry and trim to the cap. A failed write is logged, not
    /// propagated; the in-memory list updates either way.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.config.max_entries);
        if let Err(err) = self.persist() {
            log::warn!(
                "history write to {} failed: {err:#}",
                self.config.path.display()
            );
        }
    }

    /// Saved entries, most recent first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.config.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create history dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.config.path, raw)
            .with_context(|| format!("Cannot write history file {}", self.config.path.display()))
    }
}

fn load(config: &HistoryConfig) -> Result<Vec<HistoryEntry>> {
    if !config.path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&config.path)
        .with_context(|| format!("Cannot read history file {}", config.path.display()))?;
    let mut entries: Vec<HistoryEntry> = serde_json::from_str(&raw)?;
    entries.truncate(config.max_entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entry(question: &str) -> HistoryEntry {
        HistoryEntry::new(question, "an answer", vec!["1".into()])
    }

    #[test]
    fn records_most_recent_first_and_survives_reopen() {
        let temp = tempdir().unwrap();
        let config = HistoryConfig::new(temp.path().join("history.json"));

        let mut store = HistoryStore::open(config.clone());
        store.record(entry("first"));
        store.record(entry("second"));

        let reopened = HistoryStore::open(config);
        let questions: Vec<&str> = reopened
            .entries()
            .iter()
            .map(|e| e.question.as_str())
            .collect();
        assert_eq!(questions, vec!["second", "first"]);
    }

    #[test]
    fn cap_evicts_the_oldest() {
        let temp = tempdir().unwrap();
        let config = HistoryConfig::new(temp.path().join("history.json")).with_max_entries(2);

        let mut store = HistoryStore::open(config);
        store.record(entry("a"));
        store.record(entry("b"));
        store.record(entry("c"));

        let questions: Vec<&str> = store
            .entries()
            .iter()
            .map(|e| e.question.as_str())
            .collect();
        assert_eq!(questions, vec!["c", "b"]);
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = HistoryStore::open(HistoryConfig::new(path));
        assert!(store.entries().is_empty());
    }

    #[test]
    fn write_failure_still_updates_memory() {
        let temp = tempdir().unwrap();
        // A directory at the file path makes every write fail.
        let path = temp.path().join("history.json");
        std::fs::create_dir_all(&path).unwrap();

        let mut store = HistoryStore::open(HistoryConfig::new(path));
        store.record(entry("kept in memory"));
        assert_eq!(store.entries().len(), 1);
    }
}
