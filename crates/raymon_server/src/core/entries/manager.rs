use crate::core::entries::schema::{ConfigEntry, EntryStatus};
use crate::core::error::ServerError;
use chrono::Utc;
use raymon_client::build_http_client;
use raymon_error::error::EntryError;
use raymon_sensors::{discover_readers, ClusterCoordinator, EntityPublisher, StateStore};
use raymon_settings::config::ClusterEndpoint;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

struct LoadedEntry {
    entry: ConfigEntry,
    coordinator: Arc<ClusterCoordinator>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Owns every loaded config entry and the background tasks polling for it.
pub struct EntryManager {
    entries: RwLock<BTreeMap<String, LoadedEntry>>,
    setup_lock: Mutex<()>,
    store: Arc<StateStore>,
    request_timeout: Duration,
    max_stale_polls: u32,
}

impl EntryManager {
    pub fn new(store: Arc<StateStore>, request_timeout: Duration, max_stale_polls: u32) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            setup_lock: Mutex::new(()),
            store,
            request_timeout,
            max_stale_polls,
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, BTreeMap<String, LoadedEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, BTreeMap<String, LoadedEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether an entry already polls the same `host:port`.
    pub fn is_configured(&self, endpoint: &ClusterEndpoint) -> bool {
        let unique_id = endpoint.unique_id();
        self.read_entries()
            .values()
            .any(|loaded| loaded.entry.data.unique_id() == unique_id)
    }

    /// Create and load an entry for a validated endpoint.
    ///
    /// The first poll must succeed; its snapshot decides which sensors exist.
    /// Setups run one at a time so two submits for the same cluster cannot
    /// both publish entities under the same ids.
    pub async fn setup_entry(
        &self,
        title: &str,
        endpoint: &ClusterEndpoint,
    ) -> Result<ConfigEntry, EntryError> {
        let _guard = self.setup_lock.lock().await;

        if self.is_configured(endpoint) {
            return Err(EntryError::AlreadyConfigured(endpoint.unique_id()));
        }

        let entry = ConfigEntry {
            entry_id: Uuid::new_v4().simple().to_string(),
            title: title.to_string(),
            data: endpoint.clone(),
            created_at: Utc::now(),
        };

        let client = build_http_client(self.request_timeout)?;
        let coordinator = Arc::new(ClusterCoordinator::new(&entry.entry_id, endpoint, &client));
        coordinator.first_refresh().await?;

        let readers = discover_readers(&coordinator, self.max_stale_polls);
        let publisher = EntityPublisher::new(readers, self.store.clone());
        let sensor_count = publisher.readers().len();
        publisher.publish_all();

        let cancel = CancellationToken::new();
        let tasks = vec![
            tokio::spawn(publisher.run(coordinator.subscribe(), cancel.clone())),
            tokio::spawn(coordinator.clone().run(cancel.clone())),
        ];

        info!(
            "Loaded entry {} ({}) with {} sensors, polling every {}s",
            entry.title, entry.entry_id, sensor_count, endpoint.scan_interval
        );

        self.write_entries().insert(
            entry.entry_id.clone(),
            LoadedEntry {
                entry: entry.clone(),
                coordinator,
                cancel,
                tasks,
            },
        );

        Ok(entry)
    }

    /// Stop polling an entry and drop its entities.
    pub async fn unload_entry(&self, entry_id: &str) -> Result<usize, ServerError> {
        let loaded = self
            .write_entries()
            .remove(entry_id)
            .ok_or_else(|| ServerError::EntryNotFound(entry_id.to_string()))?;

        loaded.cancel.cancel();
        for task in loaded.tasks {
            if let Err(e) = task.await {
                warn!("Task for entry {} ended abnormally: {}", entry_id, e);
            }
        }

        let removed = self.store.remove_entry(entry_id);
        info!(
            "Unloaded entry {} ({}), removed {} entities",
            loaded.entry.title, entry_id, removed
        );
        Ok(removed)
    }

    pub async fn unload_all(&self) {
        let ids: Vec<String> = self.read_entries().keys().cloned().collect();
        for entry_id in ids {
            match self.unload_entry(&entry_id).await {
                Ok(_) => {}
                Err(ServerError::EntryNotFound(_)) => {
                    debug!("Entry {} was already unloaded", entry_id)
                }
                Err(e) => error!("Failed to unload entry {}: {}", entry_id, e),
            }
        }
    }

    pub fn list(&self) -> Vec<EntryStatus> {
        self.read_entries()
            .values()
            .map(|loaded| EntryStatus {
                entry: loaded.entry.clone(),
                coordinator: loaded.coordinator.status(),
                entities: self.store.for_entry(&loaded.entry.entry_id).len(),
            })
            .collect()
    }

    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.read_entries()
            .get(entry_id)
            .map(|loaded| loaded.entry.clone())
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }
}
