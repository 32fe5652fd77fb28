//! Mapping store - keyword → phrase persistence and the cached snapshot.
//!
//! The engine never writes mappings. It reads them through
//! [`MappingStoreClient`], which holds the last committed snapshot and
//! reloads the whole table whenever the store reports a change.
//!
//! # Module Structure
//!
//! - `client` - cached snapshot with generation-checked reloads
//! - `memory` - in-process store
//! - `json_file` - flat JSON object on disk
//! - `watcher` - file watcher that reports external writes

mod client;
mod json_file;
mod memory;
mod watcher;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::StoreError;

pub use client::{MappingStoreClient, ReloadTicket};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use watcher::StoreWatcher;

/// Keyword → phrase table, ordered by keyword
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: BTreeMap<String, String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries.get(keyword).map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    /// Keywords in ascending order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, keyword: String, phrase: String) {
        self.entries.insert(keyword, phrase);
    }

    pub(crate) fn remove(&mut self, keyword: &str) -> bool {
        self.entries.remove(keyword).is_some()
    }
}

impl FromIterator<(String, String)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Check a keyword against the trigger grammar: non-empty, no `/`, no
/// backslash, no whitespace
pub fn validate_keyword(keyword: &str) -> Result<(), StoreError> {
    let reason = if keyword.is_empty() {
        Some("keyword is empty")
    } else if keyword.contains('/') {
        Some("keyword contains '/'")
    } else if keyword.contains('\\') {
        Some("keyword contains '\\'")
    } else if keyword.chars().any(char::is_whitespace) {
        Some("keyword contains whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidKeyword {
            keyword: keyword.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Trim and validate a mapping about to be written
pub fn normalize_mapping(keyword: &str, phrase: &str) -> Result<(String, String), StoreError> {
    let keyword = keyword.trim();
    let phrase = phrase.trim();
    validate_keyword(keyword)?;
    if phrase.is_empty() {
        return Err(StoreError::EmptyPhrase(keyword.to_string()));
    }
    Ok((keyword.to_string(), phrase.to_string()))
}

/// Identifies one change subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Called after any entry is added, updated or removed. Carries no diff.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// External key-value store holding the mappings
pub trait MappingStore: Send + Sync {
    fn get_all(&self) -> Result<MappingTable, StoreError>;

    /// Add or overwrite a mapping (keyword and phrase are trimmed)
    fn set(&self, keyword: &str, phrase: &str) -> Result<(), StoreError>;

    /// Remove a mapping, returning whether it existed
    fn remove(&self, keyword: &str) -> Result<bool, StoreError>;

    fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Shared list of change callbacks
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, ChangeCallback)>>,
}

impl Subscribers {
    pub(crate) fn add(&self, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.callbacks.lock().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Invoke every callback. The list lock is released first so callbacks
    /// may read the store or subscribe again.
    pub(crate) fn notify(&self) {
        let callbacks: Vec<ChangeCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        debug!(subscribers = callbacks.len(), "Notifying mapping store subscribers");
        for callback in callbacks {
            callback();
        }
    }
}
