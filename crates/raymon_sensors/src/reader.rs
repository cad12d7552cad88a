use raymon_types::{unique_id, DeviceInfo, EntityDescription, EntityState, NodeRecord, SensorKind};
use std::fmt;
use std::sync::Arc;

use crate::coordinator::ClusterCoordinator;
use crate::source::MetricSource;

/// Pull the value a sensor of `kind` shows out of a node record.
///
/// `None` means the value cannot be computed from this record: a missing or
/// short `mem` list, an unknown GPU index, or a GPU reporting zero total
/// memory.
pub fn read_value(kind: &SensorKind, record: &NodeRecord) -> Option<f64> {
    match kind {
        SensorKind::CpuUsage => record.cpu,
        SensorKind::MemoryUsage => record.memory_percent(),
        SensorKind::GpuUsage(index) => record.gpu(*index)?.utilization_gpu,
        SensorKind::GpuMemUsage(index) => record.gpu(*index)?.memory_percent(),
        SensorKind::GpuMemUsed(index) => record.gpu(*index)?.memory_used,
        SensorKind::Field(name) => record.field(name),
    }
}

/// One sensor: a fixed hostname and field, read from a shared source.
pub struct MetricReader {
    entry_id: String,
    hostname: String,
    kind: SensorKind,
    description: EntityDescription,
    device: DeviceInfo,
    source: Arc<dyn MetricSource>,
    max_stale_polls: u32,
}

impl fmt::Debug for MetricReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricReader")
            .field("entry_id", &self.entry_id)
            .field("hostname", &self.hostname)
            .field("kind", &self.kind)
            .finish()
    }
}

impl MetricReader {
    pub fn new(
        entry_id: &str,
        hostname: &str,
        kind: SensorKind,
        device: DeviceInfo,
        source: Arc<dyn MetricSource>,
        max_stale_polls: u32,
    ) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            hostname: hostname.to_string(),
            description: kind.description(),
            kind,
            device,
            source,
            max_stale_polls: max_stale_polls.max(1),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn kind(&self) -> &SensorKind {
        &self.kind
    }

    pub fn description(&self) -> &EntityDescription {
        &self.description
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn unique_id(&self) -> String {
        unique_id(&self.hostname, &self.description.key)
    }

    pub fn read(&self) -> Option<f64> {
        let record = self.source.current_snapshot(&self.hostname)?;
        read_value(&self.kind, &record)
    }

    /// The node is in the current snapshot and that snapshot is not stale.
    pub fn available(&self) -> bool {
        self.source.consecutive_failures() < self.max_stale_polls
            && self.source.current_snapshot(&self.hostname).is_some()
    }

    pub fn state(&self) -> EntityState {
        let available = self.available();
        let value = if available { self.read() } else { None };

        EntityState::new(
            self.unique_id(),
            &self.entry_id,
            &self.hostname,
            &self.description,
            &self.device,
            value,
            available,
        )
    }
}

/// Build every reader for the nodes known to `coordinator`.
///
/// Called once after the first successful poll. Each node gets CPU and
/// memory sensors plus three sensors per GPU. Nodes or GPUs that show up in
/// later polls do not get readers.
pub fn discover_readers(
    coordinator: &Arc<ClusterCoordinator>,
    max_stale_polls: u32,
) -> Vec<MetricReader> {
    let snapshot = coordinator.snapshot();
    let source: Arc<dyn MetricSource> = coordinator.clone();
    let mut readers = Vec::new();

    for (hostname, mut device) in coordinator.device_infos() {
        let gpus = snapshot
            .get(&hostname)
            .map(|record| record.gpus().to_vec())
            .unwrap_or_default();

        // a node's model is the name of its last listed GPU
        if let Some(gpu) = gpus.last() {
            device.model = Some(gpu.name.clone());
        }

        let mut kinds = vec![SensorKind::CpuUsage, SensorKind::MemoryUsage];
        for gpu in &gpus {
            kinds.push(SensorKind::GpuUsage(gpu.index));
            kinds.push(SensorKind::GpuMemUsage(gpu.index));
            kinds.push(SensorKind::GpuMemUsed(gpu.index));
        }

        readers.extend(kinds.into_iter().map(|kind| {
            MetricReader::new(
                coordinator.entry_id(),
                &hostname,
                kind,
                device.clone(),
                source.clone(),
                max_stale_polls,
            )
        }));
    }

    readers
}
