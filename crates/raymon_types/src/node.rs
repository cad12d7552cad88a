use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One GPU as reported in a node's `gpus` list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GpuRecord {
    pub index: i64,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,

    /// Percent, 0..100
    #[serde(default, deserialize_with = "lenient_number")]
    pub utilization_gpu: Option<f64>,

    /// MB
    #[serde(default, deserialize_with = "lenient_number")]
    pub memory_used: Option<f64>,

    /// MB
    #[serde(default, deserialize_with = "lenient_number")]
    pub memory_total: Option<f64>,
}

impl GpuRecord {
    /// Used over total memory as a percentage.
    ///
    /// `None` when either value is missing or the total is zero.
    pub fn memory_percent(&self) -> Option<f64> {
        let used = self.memory_used?;
        let total = self.memory_total?;
        if total <= 0.0 {
            return None;
        }
        Some(used / total * 100.0)
    }
}

/// One entry of the dashboard's `data.summary` array.
///
/// Known fields are typed; everything else the dashboard sends is kept
/// untouched in `extra` so unknown sensor keys can still be looked up.
///
/// A known field holding the wrong type reads as absent instead of failing
/// the whole record, and GPU entries that cannot be parsed are dropped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub hostname: String,

    #[serde(default, deserialize_with = "lenient_number")]
    pub cpu: Option<f64>,

    /// `[total, used, percent_used]`
    #[serde(default, deserialize_with = "lenient_numbers")]
    pub mem: Option<Vec<Option<f64>>>,

    #[serde(default, deserialize_with = "lenient_gpus")]
    pub gpus: Option<Vec<GpuRecord>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeRecord {
    /// Parse a single summary entry.
    ///
    /// Returns `Ok(None)` for entries without a hostname, which are not nodes
    /// we can attach sensors to.
    pub fn from_value(value: Value) -> Result<Option<NodeRecord>, serde_json::Error> {
        match value.get("hostname") {
            None | Some(Value::Null) => Ok(None),
            Some(_) => serde_json::from_value(value).map(Some),
        }
    }

    /// Third element of `mem`, if the dashboard sent at least three values.
    pub fn memory_percent(&self) -> Option<f64> {
        self.mem.as_ref().and_then(|mem| mem.get(2).copied().flatten())
    }

    pub fn gpus(&self) -> &[GpuRecord] {
        self.gpus.as_deref().unwrap_or_default()
    }

    /// Linear scan; nodes carry a handful of GPUs at most.
    pub fn gpu(&self, index: i64) -> Option<&GpuRecord> {
        self.gpus().iter().find(|gpu| gpu.index == index)
    }

    /// Numeric lookup of a top-level field by name.
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "cpu" => self.cpu,
            _ => self.extra.get(name).and_then(Value::as_f64),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_str()
        .map(str::to_string)
        .unwrap_or_default())
}

fn lenient_numbers<'de, D>(deserializer: D) -> Result<Option<Vec<Option<f64>>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(items.iter().map(Value::as_f64).collect())),
        _ => Ok(None),
    }
}

fn lenient_gpus<'de, D>(deserializer: D) -> Result<Option<Vec<GpuRecord>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter_map(|gpu| serde_json::from_value(gpu).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// The per-hostname record map produced by one successful poll.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: BTreeMap<String, Arc<NodeRecord>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ClusterSnapshot {
    pub fn new(nodes: BTreeMap<String, Arc<NodeRecord>>) -> Self {
        Self {
            nodes,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, hostname: &str) -> Option<Arc<NodeRecord>> {
        self.nodes.get(hostname).cloned()
    }

    pub fn hostnames(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
