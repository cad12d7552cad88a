use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensor::{EntityDescription, Unit};

/// Identity of a cluster node as a device.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// `(domain, "{entry_id}-{hostname}")`
    pub identifiers: (String, String),
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl DeviceInfo {
    pub fn new(domain: &str, entry_id: &str, hostname: &str) -> Self {
        Self {
            identifiers: (domain.to_string(), format!("{}-{}", entry_id, hostname)),
            name: format!("Ray Cluster Node {}", hostname),
            manufacturer: None,
            model: None,
        }
    }
}

/// Published state of one sensor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntityState {
    pub unique_id: String,
    pub entry_id: String,
    pub hostname: String,
    pub name: String,
    pub key: String,
    pub state: Option<f64>,
    pub unit: Option<Unit>,
    pub icon: String,
    pub suggested_display_precision: u8,
    pub available: bool,
    pub device: DeviceInfo,
    pub last_updated: DateTime<Utc>,
}

impl EntityState {
    pub fn new(
        unique_id: String,
        entry_id: &str,
        hostname: &str,
        description: &EntityDescription,
        device: &DeviceInfo,
        state: Option<f64>,
        available: bool,
    ) -> Self {
        Self {
            unique_id,
            entry_id: entry_id.to_string(),
            hostname: hostname.to_string(),
            name: description.name.clone(),
            key: description.key.clone(),
            // an unavailable entity never reports a value
            state: if available { state } else { None },
            unit: description.unit,
            icon: description.icon.clone(),
            suggested_display_precision: description.suggested_display_precision,
            available,
            device: device.clone(),
            last_updated: Utc::now(),
        }
    }
}

/// Stable id of a sensor: `{hostname}_{key}` lowercased key.
pub fn unique_id(hostname: &str, key: &str) -> String {
    format!("{}_{}", hostname, key.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorKind;

    #[test]
    fn test_device_info() {
        let device = DeviceInfo::new("ray_cluster", "abc", "worker-1");
        assert_eq!(
            device.identifiers,
            ("ray_cluster".to_string(), "abc-worker-1".to_string())
        );
        assert_eq!(device.name, "Ray Cluster Node worker-1");
        assert!(device.model.is_none());
    }

    #[test]
    fn test_unique_id() {
        assert_eq!(unique_id("worker-1", "gpu_usage_0"), "worker-1_gpu_usage_0");
        assert_eq!(unique_id("head", "loadAvg"), "head_loadavg");
    }

    #[test]
    fn test_unavailable_state_has_no_value() {
        let device = DeviceInfo::new("ray_cluster", "abc", "head");
        let desc = SensorKind::CpuUsage.description();
        let state = EntityState::new(
            unique_id("head", &desc.key),
            "abc",
            "head",
            &desc,
            &device,
            Some(10.0),
            false,
        );
        assert_eq!(state.state, None);
        assert!(!state.available);
    }
}
