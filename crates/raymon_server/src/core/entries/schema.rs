use chrono::{DateTime, Utc};
use raymon_sensors::CoordinatorStatus;
use raymon_settings::config::ClusterEndpoint;
use serde::Serialize;

/// A configured cluster, created by a successful setup flow.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub title: String,
    pub data: ClusterEndpoint,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryStatus {
    #[serde(flatten)]
    pub entry: ConfigEntry,
    pub coordinator: CoordinatorStatus,
    pub entities: usize,
}

#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub entries: Vec<EntryStatus>,
}

#[derive(Debug, Serialize)]
pub struct UnloadResponse {
    pub entry_id: String,
    pub removed_entities: usize,
}
