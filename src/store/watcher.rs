use notify::{recommended_watcher, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Quiet period before a burst of file events is reported as one change
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches a store file for writes made by other processes
pub struct StoreWatcher {
    watcher: Option<RecommendedWatcher>,
    watcher_thread: Option<thread::JoinHandle<()>>,
}

impl StoreWatcher {
    /// Start watching `path`; `on_change` runs on a background thread once
    /// per burst of create/modify/remove events on that file.
    pub fn start<F>(path: &Path, on_change: F) -> NotifyResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| notify::Error::generic("store path has no file name"))?;

        // Watch the directory so atomic replace-by-rename is still seen
        let watch_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (watch_tx, watch_rx) = channel();
        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = watch_tx.send(res);
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        info!(
            path = %watch_dir.display(),
            target = ?file_name,
            "Store watcher started"
        );

        let watcher_thread = thread::spawn(move || {
            Self::watch_loop(watch_rx, &file_name, on_change);
        });

        Ok(Self {
            watcher: Some(watcher),
            watcher_thread: Some(watcher_thread),
        })
    }

    fn watch_loop<F: Fn()>(
        rx: Receiver<notify::Result<notify::Event>>,
        file_name: &std::ffi::OsStr,
        on_change: F,
    ) {
        let is_store_event = |event: &notify::Event| {
            let touches_store = event
                .paths
                .iter()
                .any(|path| path.file_name() == Some(file_name));
            let relevant_kind = matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            );
            touches_store && relevant_kind
        };

        loop {
            match rx.recv() {
                Ok(Ok(event)) if is_store_event(&event) => {
                    // Coalesce the rest of the burst
                    loop {
                        match rx.recv_timeout(WATCH_DEBOUNCE) {
                            Ok(_) => continue,
                            Err(RecvTimeoutError::Timeout) => break,
                            Err(RecvTimeoutError::Disconnected) => return,
                        }
                    }
                    debug!(file = ?file_name, "Store file changed");
                    on_change();
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, watcher = "store", "File watcher error");
                }
                Err(_) => {
                    info!(watcher = "store", "Store watcher shutting down");
                    break;
                }
            }
        }
    }
}

impl Drop for StoreWatcher {
    fn drop(&mut self) {
        // Dropping the watcher closes the channel, which ends the loop
        self.watcher.take();
        if let Some(handle) = self.watcher_thread.take() {
            let _ = handle.join();
        }
    }
}
