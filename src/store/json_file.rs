//! Mapping store persisted as a flat JSON object.
//!
//! Format: `{ "<keyword>": "<phrase>", ... }`. Entries whose value is not a
//! string, or whose key is not a valid keyword, are skipped on read.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{
    normalize_mapping, validate_keyword, ChangeCallback, MappingStore, MappingTable,
    StoreWatcher, Subscribers, SubscriptionId,
};
use crate::error::StoreError;

pub struct JsonFileStore {
    path: PathBuf,
    subscribers: Arc<Subscribers>,
    watcher: Mutex<Option<StoreWatcher>>,
    // Serializes read-modify-write cycles from this process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscribers: Arc::new(Subscribers::default()),
            watcher: Mutex::new(None),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Also report changes written to the file by other processes.
    /// Calling this twice keeps the first watcher.
    pub fn watch(&self) -> notify::Result<()> {
        let mut watcher = self.watcher.lock();
        if watcher.is_some() {
            return Ok(());
        }
        let subscribers = Arc::clone(&self.subscribers);
        *watcher = Some(StoreWatcher::start(&self.path, move || {
            subscribers.notify();
        })?);
        Ok(())
    }

    fn read_raw(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_raw(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl MappingStore for JsonFileStore {
    fn get_all(&self) -> Result<MappingTable, StoreError> {
        let raw = self.read_raw()?;
        let mut table = MappingTable::new();

        for (keyword, value) in raw {
            let Value::String(phrase) = value else {
                warn!(keyword = %keyword, "Skipping mapping with non-string phrase");
                continue;
            };
            if let Err(e) = validate_keyword(&keyword) {
                warn!(error = %e, "Skipping mapping with invalid keyword");
                continue;
            }
            table.insert(keyword, phrase);
        }

        debug!(path = %self.path.display(), count = table.len(), "Read mapping store");
        Ok(table)
    }

    fn set(&self, keyword: &str, phrase: &str) -> Result<(), StoreError> {
        let (keyword, phrase) = normalize_mapping(keyword, phrase)?;
        {
            let _guard = self.write_lock.lock();
            let mut raw = self.read_raw()?;
            raw.insert(keyword.clone(), Value::String(phrase));
            self.write_raw(&raw)?;
        }
        info!(keyword = %keyword, path = %self.path.display(), "Saved mapping");
        self.subscribers.notify();
        Ok(())
    }

    fn remove(&self, keyword: &str) -> Result<bool, StoreError> {
        let removed = {
            let _guard = self.write_lock.lock();
            let mut raw = self.read_raw()?;
            let removed = raw.remove(keyword).is_some();
            if removed {
                self.write_raw(&raw)?;
            }
            removed
        };
        if removed {
            info!(keyword = %keyword, path = %self.path.display(), "Removed mapping");
            self.subscribers.notify();
        }
        Ok(removed)
    }

    fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId {
        self.subscribers.add(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("mappings.json"));
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_set_persists_and_remove_deletes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mappings.json");
        let store = JsonFileStore::new(&path);

        store.set("sig", "Best regards,\nKim").unwrap();
        store.set("addr", "123 Main St").unwrap();

        let reopened = JsonFileStore::new(&path);
        let table = reopened.get_all().unwrap();
        assert_eq!(table.get("sig"), Some("Best regards,\nKim"));
        assert_eq!(table.len(), 2);

        assert!(store.remove("addr").unwrap());
        assert!(!store.remove("addr").unwrap());
        assert_eq!(reopened.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_non_string_and_invalid_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        fs::write(
            &path,
            r#"{"ok": "fine", "num": 42, "has space": "nope", "a/b": "nope"}"#,
        )
        .unwrap();

        let table = JsonFileStore::new(&path).get_all().unwrap();
        assert_eq!(table.keywords().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        fs::write(&path, "[1, 2").unwrap();

        let result = JsonFileStore::new(&path).get_all();
        assert!(matches!(result, Err(StoreError::Json(_))));
    }

    #[test]
    fn test_writes_notify_subscribers() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("mappings.json"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let id = store.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.set("sig", "Best").unwrap();
        assert!(store.unsubscribe(id));
        store.set("sig", "Better").unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watch_notifies_on_external_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        let store = JsonFileStore::new(&path);
        store.watch().unwrap();
        // Second call keeps the running watcher
        store.watch().unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        store.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        fs::write(&path, r#"{"sig": "From elsewhere"}"#).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while hits.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(hits.load(Ordering::SeqCst) > 0);
        assert_eq!(store.get_all().unwrap().get("sig"), Some("From elsewhere"));
    }
}
