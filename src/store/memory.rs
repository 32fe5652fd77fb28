use parking_lot::RwLock;
use tracing::debug;

use super::{normalize_mapping, ChangeCallback, MappingStore, MappingTable, Subscribers, SubscriptionId};
use crate::error::StoreError;

/// In-process mapping store
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<MappingTable>,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with mappings; entries are not validated
    pub fn with_mappings<I, K, V>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = mappings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            table: RwLock::new(table),
            subscribers: Subscribers::default(),
        }
    }
}

impl MappingStore for MemoryStore {
    fn get_all(&self) -> Result<MappingTable, StoreError> {
        Ok(self.table.read().clone())
    }

    fn set(&self, keyword: &str, phrase: &str) -> Result<(), StoreError> {
        let (keyword, phrase) = normalize_mapping(keyword, phrase)?;
        debug!(keyword = %keyword, "Setting mapping");
        self.table.write().insert(keyword, phrase);
        self.subscribers.notify();
        Ok(())
    }

    fn remove(&self, keyword: &str) -> Result<bool, StoreError> {
        let removed = self.table.write().remove(keyword);
        if removed {
            debug!(keyword = %keyword, "Removed mapping");
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
