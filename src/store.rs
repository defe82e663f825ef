//! Persistence Store
//!
//! Durable storage for exactly one JSON document under one well-known file.
//! The store is the engine's durability backend and nothing else: it owns the
//! on-disk schema but holds no state of its own.
//!
//! Failure handling is deliberately one-sided. A missing, unreadable, or
//! malformed document degrades to the default skeleton without surfacing an
//! error, and a failed write is logged but never propagated; the in-memory
//! document stays authoritative for the rest of the process either way.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::AggregateDocument;

/// File name of the persisted analytics document inside the data directory.
pub const STORAGE_FILE: &str = "mindgym_analytics.json";

pub struct AnalyticsStore {
    path: PathBuf,
}

impl AnalyticsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted in a data directory, using the well-known file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document, or the default skeleton when the file is
    /// absent or unreadable.
    pub fn load(&self) -> AggregateDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted analytics document, starting fresh");
                return AggregateDocument::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read analytics document");
                return AggregateDocument::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed analytics document, starting fresh");
                AggregateDocument::default()
            }
        }
    }

    /// Serialize and overwrite the persisted document. Write failures are
    /// logged, not returned.
    pub fn save(&self, doc: &AggregateDocument) {
        let payload = match serde_json::to_string_pretty(doc) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize analytics document");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create data directory");
                return;
            }
        }

        if let Err(e) = fs::write(&self.path, payload) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist analytics document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, Settings, Theme};
    use chrono::Utc;
    use serde_json::Map;
    use tempfile::tempdir;

    fn sample_session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            module: "beep-tracker".to_string(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            duration: 60,
            score: Some(90),
            metrics: Map::new(),
        }
    }

    #[test]
    fn test_load_missing_file_returns_skeleton() {
        let dir = tempdir().unwrap();
        let store = AnalyticsStore::in_dir(dir.path());
        let doc = store.load();
        assert!(doc.sessions.is_empty());
        assert_eq!(doc.totals.sessions_completed, 0);
    }

    #[test]
    fn test_load_malformed_file_returns_skeleton() {
        let dir = tempdir().unwrap();
        let store = AnalyticsStore::in_dir(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        let doc = store.load();
        assert!(doc.sessions.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = AnalyticsStore::in_dir(dir.path());

        let mut doc = AggregateDocument::default();
        doc.sessions.push(sample_session("a1"));
        doc.totals.sessions_completed = 1;
        doc.totals.time_spent = 60;
        doc.settings = Settings {
            master_volume: 40,
            sound_effects: false,
            theme: Theme::Light,
        };
        store.save(&doc);

        let loaded = store.load();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_save_creates_data_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("deeper").join("still");
        let store = AnalyticsStore::in_dir(&nested);
        store.save(&AggregateDocument::default());
        assert!(store.path().exists());
    }
}
