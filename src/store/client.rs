use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, instrument};

use super::{MappingStore, MappingTable, SubscriptionId};
use crate::error::{ExpandError, ResultExt, StoreError};

/// Handle for one in-flight reload.
///
/// Only the most recently issued ticket may install its table, so a slow
/// read that finishes after a newer one is discarded. An older ticket may
/// still install when every ticket issued after it has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    generation: u64,
}

/// Cached view of the mapping store.
///
/// Readers take [`MappingStoreClient::snapshot`] and never wait on a
/// reload: the new table is built off to the side and swapped in.
pub struct MappingStoreClient {
    snapshot: RwLock<Arc<MappingTable>>,
    issued: AtomicU64,
    installed: AtomicU64,
    /// Failed generations newer than the installed one
    failed: Mutex<BTreeSet<u64>>,
}

impl Default for MappingStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingStoreClient {
    /// Client with an empty table; nothing is loaded yet
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(MappingTable::new())),
            issued: AtomicU64::new(0),
            installed: AtomicU64::new(0),
            failed: Mutex::new(BTreeSet::new()),
        }
    }

    /// Create a client, load the store once and reload on every change
    /// notification. The subscription holds only a weak reference to the
    /// client.
    pub fn connect(store: Arc<dyn MappingStore>) -> (Arc<Self>, SubscriptionId) {
        let client = Arc::new(Self::new());
        client.reload(store.as_ref());

        let weak: Weak<Self> = Arc::downgrade(&client);
        let source = Arc::downgrade(&store);
        let id = store.subscribe(Arc::new(move || {
            if let (Some(client), Some(store)) = (weak.upgrade(), source.upgrade()) {
                info!("Mapping store changed, reloading");
                client.reload(store.as_ref());
            }
        }));
        (client, id)
    }

    /// The last committed table
    pub fn snapshot(&self) -> Arc<MappingTable> {
        Arc::clone(&self.snapshot.read())
    }

    /// Whether any reload has completed successfully
    pub fn is_loaded(&self) -> bool {
        self.installed.load(Ordering::Acquire) != 0
    }

    pub fn begin_reload(&self) -> ReloadTicket {
        let generation = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation, "Mapping reload started");
        ReloadTicket { generation }
    }

    /// Install the result of a reload.
    ///
    /// Returns `true` if the table was installed. Stale tickets are dropped;
    /// a failed read keeps the previous table (empty before the first load).
    pub fn finish_reload(
        &self,
        ticket: ReloadTicket,
        result: Result<MappingTable, StoreError>,
    ) -> bool {
        let table = match result {
            Ok(table) => table,
            Err(e) => {
                self.failed.lock().insert(ticket.generation);
                error!(
                    error = %e,
                    generation = ticket.generation,
                    kept = self.snapshot.read().len(),
                    "Mapping store unavailable, keeping cached table"
                );
                return false;
            }
        };

        let mut snapshot = self.snapshot.write();
        let latest = self.issued.load(Ordering::Acquire);
        let installed = self.installed.load(Ordering::Acquire);
        let mut failed = self.failed.lock();
        let newer_all_failed =
            (ticket.generation + 1..=latest).all(|generation| failed.contains(&generation));
        if ticket.generation <= installed || !newer_all_failed {
            debug!(
                generation = ticket.generation,
                latest, installed, "Discarding superseded mapping reload"
            );
            return false;
        }

        info!(count = table.len(), generation = ticket.generation, "Mappings loaded");
        *snapshot = Arc::new(table);
        self.installed.store(ticket.generation, Ordering::Release);
        failed.retain(|&generation| generation > ticket.generation);
        true
    }

    /// Read the whole store and install it; a failed read is returned
    /// and the cached table is kept
    pub fn try_reload(&self, store: &dyn MappingStore) -> Result<bool, ExpandError> {
        let ticket = self.begin_reload();
        match store.get_all() {
            Ok(table) => Ok(self.finish_reload(ticket, Ok(table))),
            Err(e) => {
                self.failed.lock().insert(ticket.generation);
                Err(e.into())
            }
        }
    }

    /// [`MappingStoreClient::try_reload`], logging failures
    #[instrument(skip_all)]
    pub fn reload(&self, store: &dyn MappingStore) -> bool {
        self.try_reload(store).log_err().unwrap_or(false)
    }
}
