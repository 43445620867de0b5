//! Durable storage for the bond document
//!
//! A single JSON file. Writes go to a sibling temp file which is then
//! renamed over the target, so a crash mid-write leaves the previous
//! file intact.

use crate::error::{BondError, Result};
use crate::state::BondDocument;
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What `load_or_default` found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A saved document was loaded
    Loaded,
    /// No file yet, starting from defaults
    Fresh,
    /// The file was unreadable or corrupt, starting from defaults
    Recovered,
}

/// File-backed store. Writers are serialised through an internal lock.
#[derive(Debug)]
pub struct BondStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl BondStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved document.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<BondDocument>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BondError::storage(&self.path, e)),
        };

        let document: BondDocument =
            serde_json::from_str(&content).map_err(|source| BondError::Decode {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            path = %self.path.display(),
            version = document.self_version,
            history = document.bond.history.len(),
            "Loaded bond document"
        );
        Ok(Some(document))
    }

    /// Load the saved document, falling back to defaults on any failure.
    ///
    /// A corrupt file is moved aside to `<name>.corrupt` so the next save
    /// does not destroy it.
    pub fn load_or_default(&self) -> (BondDocument, LoadOutcome) {
        match self.load() {
            Ok(Some(document)) => {
                if !document.is_consistent() {
                    warn!(
                        version = document.self_version,
                        updates = document.updates.len(),
                        "Update log does not match self version"
                    );
                }
                info!(path = %self.path.display(), "Memory loaded from persistent storage");
                (document, LoadOutcome::Loaded)
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No memory file found, starting fresh");
                (BondDocument::default(), LoadOutcome::Fresh)
            }
            Err(e @ BondError::Decode { .. }) => {
                warn!(error = %e, "Loading memory failed, starting fresh");
                self.quarantine();
                (BondDocument::default(), LoadOutcome::Recovered)
            }
            Err(e) => {
                warn!(error = %e, "Loading memory failed, starting fresh");
                (BondDocument::default(), LoadOutcome::Recovered)
            }
        }
    }

    /// Save a document
    pub fn save(&self, document: &BondDocument) -> Result<()> {
        self.save_with(|| document.clone())
    }

    /// Take a snapshot and save it while holding the writer lock.
    ///
    /// Snapshots are taken in the same order as writes land, so an older
    /// state can never overwrite a newer one.
    pub fn save_with<F>(&self, snapshot: F) -> Result<()>
    where
        F: FnOnce() -> BondDocument,
    {
        let _guard = self.write_lock.lock();
        let document = snapshot();
        let json = serde_json::to_string_pretty(&document)?;

        self.write_atomic(json.as_bytes())?;

        debug!(path = %self.path.display(), version = document.self_version, "Memory saved");
        Ok(())
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BondError::storage(parent, e))?;
        }

        let tmp = self.temp_path();
        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(BondError::storage(&self.path, e));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "memory.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }

    fn quarantine(&self) {
        let mut target = self.path.clone().into_os_string();
        target.push(".corrupt");
        let target = PathBuf::from(target);

        match fs::rename(&self.path, &target) {
            Ok(()) => warn!(path = %target.display(), "Moved unreadable memory file aside"),
            Err(e) => warn!(error = %e, "Failed to move unreadable memory file aside"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionLabel;
    use crate::state::Bond;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_store() -> (BondStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BondStore::new(dir.path().join("lucy").join("memory.json"));
        (store, dir)
    }

    #[test]
    fn test_load_missing_file() {
        let (store, _dir) = create_test_store();
        assert!(store.load().unwrap().is_none());

        let (doc, outcome) = store.load_or_default();
        assert_eq!(outcome, LoadOutcome::Fresh);
        assert_eq!(doc.self_version, 1);
        assert_eq!(doc, BondDocument::default());
    }

    #[test]
    fn test_save_creates_directories() {
        let (store, _dir) = create_test_store();
        assert!(!store.path().parent().unwrap().exists());

        store.save(&BondDocument::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_load() {
        let (store, _dir) = create_test_store();
        let bond = Bond::default();
        bond.record_turn(EmotionLabel::Sadness, "so sad");
        bond.tick();

        store.save(&bond.snapshot()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, bond.snapshot());
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let (store, _dir) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{"bond": {"loyalty": 0.75, "emotional_state": "anger",
                "history": [{"time": 1700000000.25, "message": "hi", "emotion": "anger"}]},
               "self_version": 2, "updates": ["Auto-update version 2"],
               "plugins": ["x"]}"#,
        )
        .unwrap();

        let first = store.load().unwrap().unwrap();
        store.save(&first).unwrap();
        let saved_once = fs::read_to_string(store.path()).unwrap();

        let second = store.load().unwrap().unwrap();
        store.save(&second).unwrap();
        let saved_twice = fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(saved_once, saved_twice);

        let value: serde_json::Value = serde_json::from_str(&saved_twice).unwrap();
        assert_eq!(value["plugins"][0], "x");
        assert_eq!(value["bond"]["loyalty"], 0.75);
        assert_eq!(value["bond"]["history"][0]["time"], 1700000000.25);
    }

    #[test]
    fn test_unknown_emotion_keeps_history() {
        let (store, _dir) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{"bond": {"loyalty": 1.0, "emotional_state": "fear",
                "history": [
                    {"time": 1.5, "message": "boo", "emotion": "fear"},
                    {"time": 2.5, "message": "I love you", "emotion": "love"}
                ]},
               "self_version": 3, "updates": ["Auto-update version 2", "Auto-update version 3"]}"#,
        )
        .unwrap();

        let (doc, outcome) = store.load_or_default();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert!(store.path().exists());
        assert_eq!(doc.self_version, 3);
        assert_eq!(doc.bond.emotional_state, EmotionLabel::Neutral);
        assert_eq!(doc.bond.history.len(), 2);
        assert_eq!(doc.bond.history[0].message, "boo");
        assert_eq!(doc.bond.history[0].emotion, EmotionLabel::Neutral);
        assert_eq!(doc.bond.history[1].emotion, EmotionLabel::Love);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let (store, dir) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(BondError::Decode { .. })));

        let (doc, outcome) = store.load_or_default();
        assert_eq!(outcome, LoadOutcome::Recovered);
        assert_eq!(doc, BondDocument::default());
        assert!(!store.path().exists());
        assert!(dir.path().join("lucy").join("memory.json.corrupt").exists());
    }

    #[test]
    fn test_save_failure_keeps_previous_file() {
        let (store, _dir) = create_test_store();
        let mut doc = BondDocument::default();
        doc.self_version = 5;
        store.save(&doc).unwrap();

        // A directory squatting on the temp path makes the write fail
        fs::create_dir_all(store.temp_path()).unwrap();
        doc.self_version = 6;
        let err = store.save(&doc).unwrap_err();
        assert!(matches!(err, BondError::StorageUnavailable { .. }));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.self_version, 5);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (store, _dir) = create_test_store();
        store.save(&BondDocument::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["memory.json".to_string()]);
    }

    #[test]
    fn test_concurrent_saves_produce_valid_file() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);
        let bond = Bond::default();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                let bond = bond.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        if i % 2 == 0 {
                            bond.tick();
                        } else {
                            bond.record_turn(EmotionLabel::Joy, format!("{}-{}", i, j));
                        }
                        store.save_with(|| bond.snapshot()).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, bond.snapshot());
        assert_eq!(loaded.self_version, 51);
        assert_eq!(loaded.bond.history.len(), 50);
    }
}
