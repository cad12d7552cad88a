use raymon_types::EntityState;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::reader::MetricReader;

/// Latest published state of every entity, keyed by unique id.
#[derive(Debug, Default)]
pub struct StateStore {
    states: RwLock<BTreeMap<String, EntityState>>,
}

impl StateStore {
    pub fn new() -> Self {
        StateStore::default()
    }

    fn read_states(&self) -> RwLockReadGuard<'_, BTreeMap<String, EntityState>> {
        self.states.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_states(&self) -> RwLockWriteGuard<'_, BTreeMap<String, EntityState>> {
        self.states.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn publish(&self, state: EntityState) {
        self.write_states().insert(state.unique_id.clone(), state);
    }

    pub fn get(&self, unique_id: &str) -> Option<EntityState> {
        self.read_states().get(unique_id).cloned()
    }

    pub fn all(&self) -> Vec<EntityState> {
        self.read_states().values().cloned().collect()
    }

    pub fn for_entry(&self, entry_id: &str) -> Vec<EntityState> {
        self.read_states()
            .values()
            .filter(|state| state.entry_id == entry_id)
            .cloned()
            .collect()
    }

    /// Drop every entity of an unloaded entry.
    pub fn remove_entry(&self, entry_id: &str) -> usize {
        let mut states = self.write_states();
        let before = states.len();
        states.retain(|_, state| state.entry_id != entry_id);
        before - states.len()
    }

    pub fn len(&self) -> usize {
        self.read_states().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_states().is_empty()
    }
}

/// Re-renders a fixed set of readers into the state store.
pub struct EntityPublisher {
    readers: Vec<MetricReader>,
    store: Arc<StateStore>,
}

impl EntityPublisher {
    pub fn new(readers: Vec<MetricReader>, store: Arc<StateStore>) -> Self {
        Self { readers, store }
    }

    pub fn readers(&self) -> &[MetricReader] {
        &self.readers
    }

    pub fn publish_all(&self) {
        for reader in &self.readers {
            self.store.publish(reader.state());
        }
    }

    /// Publish once, then again after every coordinator update, until
    /// cancelled or the coordinator goes away.
    pub async fn run(self, mut updates: watch::Receiver<u64>, cancel: CancellationToken) {
        self.publish_all();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.publish_all();
                    debug!("Published {} entities", self.readers.len());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::ClusterCoordinator;
    use crate::reader::discover_readers;
    use mockito::{Matcher, Server, ServerGuard};
    use raymon_client::build_http_client;
    use raymon_settings::config::ClusterEndpoint;
    use std::time::Duration;

    const SUMMARY: &str = r#"{"data": {"summary": [
        {"hostname": "head", "cpu": 5.0, "mem": [100, 40, 40.0], "gpus": []},
        {"hostname": "worker-1", "cpu": 70.0, "mem": [100, 80, 80.0],
         "gpus": [
            {"index": 0, "name": "Tesla T4", "utilizationGpu": 10, "memoryUsed": 256, "memoryTotal": 1024},
            {"index": 1, "name": "NVIDIA L4", "utilizationGpu": 20, "memoryUsed": 512, "memoryTotal": 1024}
         ]}
    ]}}"#;

    async fn setup() -> (ServerGuard, Arc<ClusterCoordinator>) {
        let server = Server::new_async().await;
        let addr = server.host_with_port();
        let (host, port) = addr.rsplit_once(':').unwrap();
        let endpoint = ClusterEndpoint::new(host, port.parse().unwrap(), 60);
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let coordinator = Arc::new(ClusterCoordinator::new("e1", &endpoint, &client));
        (server, coordinator)
    }

    async fn mock_summary(server: &mut ServerGuard, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", Matcher::Regex(r"^/nodes".to_string()))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_discover_readers() {
        let (mut server, coordinator) = setup().await;
        let _mock = mock_summary(&mut server, 200, SUMMARY).await;
        coordinator.first_refresh().await.unwrap();

        let readers = discover_readers(&coordinator, 1);
        // head: cpu + mem, worker-1: cpu + mem + 2 gpus * 3
        assert_eq!(readers.len(), 10);

        let worker: Vec<_> = readers
            .iter()
            .filter(|r| r.hostname() == "worker-1")
            .collect();
        assert!(worker
            .iter()
            .all(|r| r.device().model.as_deref() == Some("NVIDIA L4")));

        let head = readers.iter().find(|r| r.hostname() == "head").unwrap();
        assert_eq!(head.device().model, None);
    }

    #[tokio::test]
    async fn test_publish_and_go_unavailable() {
        let (mut server, coordinator) = setup().await;
        let ok = mock_summary(&mut server, 200, SUMMARY).await;
        coordinator.first_refresh().await.unwrap();

        let store = Arc::new(StateStore::new());
        let publisher = EntityPublisher::new(discover_readers(&coordinator, 1), store.clone());
        publisher.publish_all();

        let state = store.get("worker-1_gpu_memusage_0").unwrap();
        assert_eq!(state.state, Some(25.0));
        assert!(state.available);
        assert_eq!(store.for_entry("e1").len(), 10);

        ok.remove_async().await;
        let _bad = mock_summary(&mut server, 500, "boom").await;
        assert!(coordinator.refresh().await.is_err());
        publisher.publish_all();

        let state = store.get("head_cpu_usage").unwrap();
        assert!(!state.available);
        assert_eq!(state.state, None);

        assert_eq!(store.remove_entry("e1"), 10);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_run_republishes_on_update() {
        let (mut server, coordinator) = setup().await;
        let first = mock_summary(&mut server, 200, SUMMARY).await;
        coordinator.first_refresh().await.unwrap();

        let store = Arc::new(StateStore::new());
        let publisher = EntityPublisher::new(discover_readers(&coordinator, 1), store.clone());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher.run(coordinator.subscribe(), cancel.clone()));

        first.remove_async().await;
        let _second = mock_summary(
            &mut server,
            200,
            r#"{"data": {"summary": [{"hostname": "head", "cpu": 42.0, "mem": [100, 40, 40.0]}]}}"#,
        )
        .await;
        coordinator.refresh().await.unwrap();

        let mut published = false;
        for _ in 0..50 {
            if store.get("head_cpu_usage").and_then(|s| s.state) == Some(42.0) {
                published = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(published);

        // worker-1 vanished from the latest poll
        assert!(!store.get("worker-1_cpu_usage").unwrap().available);

        cancel.cancel();
        handle.await.unwrap();
    }
}
