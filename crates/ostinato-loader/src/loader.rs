//! The hot-reload loader.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use libloading::Library;
use parking_lot::Mutex;

use ostinato_host::PluginRegistry;

use crate::artifact;
use crate::catalog::{CatalogClient, CatalogEntry};
use crate::error::{LoaderError, Result};
use crate::events::LoaderEvent;

/// Request timeout for catalog and artifact fetches.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

struct LoadedArtifact {
    filename: String,
    #[allow(dead_code)]
    path: PathBuf,
    /// Dropped on unload; classes and instances hold their own keepalives.
    _library: Arc<Library>,
}

struct Poller {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Keeps the registry synchronised with an external catalog service,
/// installing, upgrading, and revoking plugin classes without interrupting
/// the audio session.
///
/// Failures inside the polling loop never propagate; they are logged and
/// reported through the [`LoaderEvent`] stream.
pub struct PluginLoader {
    registry: Arc<PluginRegistry>,
    client: CatalogClient,
    artifacts_dir: PathBuf,
    loaded: Mutex<HashMap<String, LoadedArtifact>>,
    fetch_serial: AtomicU64,
    subscribers: Mutex<Vec<Sender<LoaderEvent>>>,
    poller: Mutex<Option<Poller>>,
}

impl PluginLoader {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

    /// Create a loader against a catalog base URL. `artifacts_dir` is
    /// created if needed; fetched artifacts land there under
    /// `<id>-<serial><ext>` names.
    pub fn new(
        registry: Arc<PluginRegistry>,
        base_url: impl Into<String>,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let artifacts_dir = artifacts_dir.into();
        std::fs::create_dir_all(&artifacts_dir)?;

        Ok(Self {
            registry,
            client: CatalogClient::new(base_url, HTTP_TIMEOUT),
            artifacts_dir,
            loaded: Mutex::new(HashMap::new()),
            fetch_serial: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
            poller: Mutex::new(None),
        })
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn catalog_url(&self) -> &str {
        self.client.base_url()
    }

    /// Receive a copy of every subsequent loader event.
    pub fn subscribe(&self) -> Receiver<LoaderEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn emit(&self, event: LoaderEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.loaded.lock().contains_key(id)
    }

    pub fn loaded_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.loaded.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Fetch the catalog and load every enabled entry that is not already
    /// loaded. A single failing artifact does not block the batch. Returns
    /// the catalog list.
    pub fn load_all(&self) -> Result<Vec<CatalogEntry>> {
        let entries = self.client.list()?;
        for entry in &entries {
            if entry.enabled && !self.is_loaded(&entry.id) {
                self.load(entry);
            }
        }
        Ok(entries)
    }

    /// Fetch, install, and register one catalog entry. Never panics or
    /// propagates; failures are logged and reported as events.
    pub fn load(&self, entry: &CatalogEntry) -> bool {
        match self.try_load(entry) {
            Ok(()) => {
                tracing::info!(id = %entry.id, file = %entry.filename, "loaded plugin");
                self.emit(LoaderEvent::Loaded {
                    id: entry.id.clone(),
                });
                true
            }
            Err(err) => {
                tracing::warn!(id = %entry.id, error = %err, "failed to load plugin");
                self.emit(LoaderEvent::LoadFailed {
                    id: entry.id.clone(),
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    fn try_load(&self, entry: &CatalogEntry) -> Result<()> {
        let serial = self.fetch_serial.fetch_add(1, Ordering::Relaxed);
        let extension = Path::new(&entry.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let dest = self
            .artifacts_dir
            .join(format!("{}-{}{}", entry.id, serial, extension));

        self.client.fetch_artifact(&entry.filename, serial, &dest)?;
        let library = artifact::install(&dest, &entry.id, &self.registry)?;

        self.loaded.lock().insert(
            entry.id.clone(),
            LoadedArtifact {
                filename: entry.filename.clone(),
                path: dest,
                _library: library,
            },
        );
        Ok(())
    }

    /// Revoke the prior installation of `id` and install it afresh from the
    /// catalog.
    pub fn reload(&self, id: &str) -> bool {
        if self.loaded.lock().remove(id).is_some() {
            self.registry.unregister_class(id);
        }

        let entry = match self.client.list() {
            Ok(entries) => entries.into_iter().find(|entry| entry.id == id),
            Err(err) => {
                tracing::warn!(id, error = %err, "reload: catalog unavailable");
                self.emit(LoaderEvent::CatalogUnavailable {
                    reason: err.to_string(),
                });
                return false;
            }
        };

        let Some(entry) = entry else {
            tracing::warn!(id, "reload: {}", LoaderError::UnknownCatalogEntry(id.into()));
            return false;
        };

        match self.try_load(&entry) {
            Ok(()) => {
                tracing::info!(id, "reloaded plugin");
                self.emit(LoaderEvent::Reloaded { id: id.to_string() });
                true
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to reload plugin");
                self.emit(LoaderEvent::LoadFailed {
                    id: id.to_string(),
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    /// Remove `id` from the registry and drop the loader's library handle.
    /// Live instances keep functioning (they hold the class captured at
    /// creation); only future creates fail *unknown-plugin*.
    pub fn unload(&self, id: &str) -> bool {
        if self.loaded.lock().remove(id).is_none() {
            return false;
        }
        self.registry.unregister_class(id);
        tracing::info!(id, "unloaded plugin");
        self.emit(LoaderEvent::Unloaded { id: id.to_string() });
        true
    }

    /// One polling tick: load enabled entries that appeared, unload loaded
    /// ids that disappeared or were disabled. Catalog failures skip the tick.
    pub fn check_for_updates(&self) {
        let entries = match self.client.list() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "catalog poll failed; keeping last-known state");
                self.emit(LoaderEvent::CatalogUnavailable {
                    reason: err.to_string(),
                });
                return;
            }
        };

        for entry in &entries {
            if entry.enabled && !self.is_loaded(&entry.id) {
                self.load(entry);
            }
        }

        let enabled: HashSet<&str> = entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.id.as_str())
            .collect();
        let stale: Vec<String> = self
            .loaded
            .lock()
            .keys()
            .filter(|id| !enabled.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.unload(&id);
        }
    }

    /// Begin periodic [`check_for_updates`](Self::check_for_updates) on a
    /// named worker thread. Replaces any existing poller.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) {
        self.stop_polling();

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let loader = Arc::clone(self);
        let thread = std::thread::Builder::new()
            .name("ostinato-plugin-poll".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => loader.check_for_updates(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("failed to spawn polling thread");

        *self.poller.lock() = Some(Poller {
            stop: stop_tx,
            thread,
        });
        tracing::info!(interval_secs = interval.as_secs_f64(), "polling started");
    }

    /// Stop the polling thread, if any. In-flight fetches finish; their
    /// results are discarded with the tick.
    pub fn stop_polling(&self) {
        if let Some(poller) = self.poller.lock().take() {
            let _ = poller.stop.send(());
            let _ = poller.thread.join();
            tracing::info!("polling stopped");
        }
    }

    /// Filename the loader last fetched for `id`, if loaded.
    pub fn loaded_filename(&self, id: &str) -> Option<String> {
        self.loaded.lock().get(id).map(|a| a.filename.clone())
    }
}
