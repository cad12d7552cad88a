use chrono::{DateTime, Utc};
use raymon_client::{Client, RayDashboardClient};
use raymon_error::error::PollError;
use raymon_settings::config::{ClusterEndpoint, DOMAIN};
use raymon_types::{ClusterSnapshot, DeviceInfo, NodeRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::source::MetricSource;

#[derive(Debug)]
struct CoordinatorState {
    last_good: Arc<ClusterSnapshot>,
    last_error: Option<PollError>,
    consecutive_failures: u32,
    last_success: Option<DateTime<Utc>>,
    device_infos: BTreeMap<String, DeviceInfo>,
}

/// Point-in-time view of a coordinator, for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub url: String,
    pub hostnames: Vec<String>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Polls one Ray dashboard and holds the latest good snapshot.
///
/// The snapshot is swapped whole on each successful poll. A failed poll keeps
/// the previous snapshot and records the error; readers decide from the
/// failure count whether that snapshot is still worth showing.
pub struct ClusterCoordinator {
    entry_id: String,
    endpoint: ClusterEndpoint,
    client: RayDashboardClient,
    state: RwLock<CoordinatorState>,
    updates: watch::Sender<u64>,
}

impl ClusterCoordinator {
    pub fn new(entry_id: &str, endpoint: &ClusterEndpoint, client: &Client) -> Self {
        let (updates, _) = watch::channel(0);

        Self {
            entry_id: entry_id.to_string(),
            endpoint: endpoint.clone(),
            client: RayDashboardClient::new(endpoint, client),
            state: RwLock::new(CoordinatorState {
                last_good: Arc::new(ClusterSnapshot::default()),
                last_error: None,
                consecutive_failures: 0,
                last_success: None,
                device_infos: BTreeMap::new(),
            }),
            updates,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CoordinatorState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CoordinatorState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    /// Receiver that ticks after every poll, successful or not.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> Arc<ClusterSnapshot> {
        self.read_state().last_good.clone()
    }

    pub fn last_error(&self) -> Option<PollError> {
        self.read_state().last_error.clone()
    }

    pub fn device_infos(&self) -> BTreeMap<String, DeviceInfo> {
        self.read_state().device_infos.clone()
    }

    pub fn status(&self) -> CoordinatorStatus {
        let state = self.read_state();
        CoordinatorStatus {
            url: self.client.url().to_string(),
            hostnames: state.last_good.hostnames().cloned().collect(),
            consecutive_failures: state.consecutive_failures,
            last_error: state.last_error.as_ref().map(|e| e.to_string()),
            last_success: state.last_success,
        }
    }

    fn build_snapshot(entries: Vec<Value>) -> ClusterSnapshot {
        let mut nodes = BTreeMap::new();

        for entry in entries {
            match NodeRecord::from_value(entry) {
                Ok(Some(record)) => {
                    nodes.insert(record.hostname.clone(), Arc::new(record));
                }
                Ok(None) => debug!("Skipping summary entry without hostname"),
                Err(e) => warn!("Skipping malformed summary entry: {}", e),
            }
        }

        ClusterSnapshot::new(nodes)
    }

    /// Run one poll and publish its outcome to subscribers.
    pub async fn refresh(&self) -> Result<Arc<ClusterSnapshot>, PollError> {
        let result = self.client.fetch_summary().await;

        let outcome = match result {
            Ok(entries) => {
                let snapshot = Arc::new(Self::build_snapshot(entries));
                let mut state = self.write_state();

                for hostname in snapshot.hostnames() {
                    state.device_infos.insert(
                        hostname.clone(),
                        DeviceInfo::new(DOMAIN, &self.entry_id, hostname),
                    );
                }

                state.last_good = snapshot.clone();
                state.last_error = None;
                state.consecutive_failures = 0;
                state.last_success = snapshot.fetched_at;

                debug!(
                    "Refreshed {} with {} nodes",
                    self.client.url(),
                    snapshot.len()
                );
                Ok(snapshot)
            }
            Err(e) => {
                error!("Update failed: {}", e);
                let mut state = self.write_state();
                state.last_error = Some(e.clone());
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                Err(e)
            }
        };

        self.updates.send_modify(|version| *version = version.wrapping_add(1));
        outcome
    }

    /// First poll of a new entry. Setup cannot go on without it.
    pub async fn first_refresh(&self) -> Result<Arc<ClusterSnapshot>, PollError> {
        let snapshot = self.refresh().await?;
        info!(
            "Found {} Ray nodes at {}",
            snapshot.len(),
            self.client.url()
        );
        Ok(snapshot)
    }

    /// Poll on a fixed interval until `cancel` fires.
    ///
    /// Polls never overlap: the next tick is only awaited once the previous
    /// poll has finished, and late ticks are delayed rather than bunched.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = interval(self.endpoint.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // the first tick fires immediately and setup has already polled
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        result = self.refresh() => {
                            if result.is_err() {
                                debug!(
                                    "{} consecutive failed polls for {}",
                                    self.read_state().consecutive_failures,
                                    self.client.url()
                                );
                            }
                        }
                    }
                }
            }
        }

        info!("Stopped polling {}", self.client.url());
    }
}

impl MetricSource for ClusterCoordinator {
    fn current_snapshot(&self, hostname: &str) -> Option<Arc<NodeRecord>> {
        self.read_state().last_good.get(hostname)
    }

    fn consecutive_failures(&self) -> u32 {
        self.read_state().consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use raymon_client::build_http_client;
    use std::time::Duration;

    const SUMMARY: &str = r#"{
        "result": true,
        "data": {
            "summary": [
                {"hostname": "head", "cpu": 10.0, "mem": [8192, 4096, 50.0], "gpus": []},
                {"ip": "10.0.0.9", "cpu": 99.0},
                {"hostname": "worker-1", "cpu": 20.0, "mem": [8192, 2048, 25.0],
                 "gpus": [{"index": 0, "name": "NVIDIA T4", "utilizationGpu": 40, "memoryUsed": 512, "memoryTotal": 1024}]}
            ]
        }
    }"#;

    fn summary_mock(server: &mut ServerGuard) -> Mock {
        server
            .mock("GET", Matcher::Regex(r"^/nodes".to_string()))
            .match_query(Matcher::UrlEncoded("view".into(), "summary".into()))
    }

    async fn setup() -> (ServerGuard, ClusterCoordinator) {
        let server = Server::new_async().await;
        let addr = server.host_with_port();
        let (host, port) = addr.rsplit_once(':').unwrap();
        let endpoint = ClusterEndpoint::new(host, port.parse().unwrap(), 1);
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let coordinator = ClusterCoordinator::new("entry-1", &endpoint, &client);
        (server, coordinator)
    }

    #[tokio::test]
    async fn test_refresh_skips_entries_without_hostname() {
        let (mut server, coordinator) = setup().await;
        let _mock = summary_mock(&mut server)
            .with_status(200)
            .with_body(SUMMARY)
            .create_async()
            .await;

        let snapshot = coordinator.refresh().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("head").is_some());
        assert!(snapshot.get("worker-1").is_some());

        let devices = coordinator.device_infos();
        assert_eq!(
            devices["worker-1"].identifiers,
            ("ray_cluster".to_string(), "entry-1-worker-1".to_string())
        );
        assert_eq!(coordinator.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good() {
        let (mut server, coordinator) = setup().await;
        let ok = summary_mock(&mut server)
            .with_status(200)
            .with_body(SUMMARY)
            .create_async()
            .await;

        let before = coordinator.refresh().await.unwrap();
        ok.remove_async().await;

        let _bad = summary_mock(&mut server)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = coordinator.refresh().await.unwrap_err();
        assert_eq!(
            err,
            PollError::Status {
                status: 502,
                body: "bad gateway".to_string()
            }
        );

        let after = coordinator.snapshot();
        assert_eq!(before.nodes, after.nodes);
        assert_eq!(coordinator.consecutive_failures(), 1);
        assert_eq!(coordinator.last_error(), Some(err));
        assert!(coordinator.current_snapshot("head").is_some());

        let status = coordinator.status();
        assert_eq!(status.hostnames, vec!["head", "worker-1"]);
        assert!(status.last_error.unwrap().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_snapshot_is_replaced_not_merged() {
        let (mut server, coordinator) = setup().await;
        let first = summary_mock(&mut server)
            .with_status(200)
            .with_body(SUMMARY)
            .create_async()
            .await;
        coordinator.refresh().await.unwrap();
        first.remove_async().await;

        let _second = summary_mock(&mut server)
            .with_status(200)
            .with_body(r#"{"data": {"summary": [{"hostname": "head", "cpu": 55.0}]}}"#)
            .create_async()
            .await;
        let snapshot = coordinator.refresh().await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(coordinator.current_snapshot("head").unwrap().cpu, Some(55.0));
        assert!(coordinator.current_snapshot("worker-1").is_none());
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_fail_poll() {
        let (mut server, coordinator) = setup().await;
        let _mock = summary_mock(&mut server)
            .with_status(200)
            .with_body(r#"{"data": {"summary": [{"hostname": 7, "cpu": 1.0}, {"hostname": "a", "cpu": "busy"}, {"hostname": "b", "cpu": 1.0}]}}"#)
            .create_async()
            .await;

        let snapshot = coordinator.refresh().await.unwrap();
        assert_eq!(snapshot.hostnames().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(snapshot.get("a").unwrap().cpu, None);
        assert_eq!(snapshot.get("b").unwrap().cpu, Some(1.0));
    }

    #[tokio::test]
    async fn test_refresh_notifies_subscribers() {
        let (mut server, coordinator) = setup().await;
        let _mock = summary_mock(&mut server)
            .with_status(500)
            .create_async()
            .await;

        let mut updates = coordinator.subscribe();
        assert!(coordinator.refresh().await.is_err());
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (mut server, coordinator) = setup().await;
        let _mock = summary_mock(&mut server)
            .with_status(200)
            .with_body(SUMMARY)
            .create_async()
            .await;

        let coordinator = Arc::new(coordinator);
        let mut updates = coordinator.subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(coordinator.clone().run(cancel.clone()));

        tokio::time::timeout(Duration::from_secs(5), updates.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(coordinator.snapshot().len(), 2);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
