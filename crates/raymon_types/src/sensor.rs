use serde::{Deserialize, Serialize};
use std::fmt;

pub const CPU_USAGE: &str = "cpu_usage";
pub const MEMORY_USAGE: &str = "memory_usage";
pub const GPU_USAGE_PREFIX: &str = "gpu_usage_";
pub const GPU_MEMUSAGE_PREFIX: &str = "gpu_memusage_";
pub const GPU_MEMUSED_PREFIX: &str = "gpu_memused_";

pub const DISPLAY_PRECISION: u8 = 2;

/// Which field of a node record a sensor surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SensorKind {
    CpuUsage,
    MemoryUsage,
    GpuUsage(i64),
    GpuMemUsage(i64),
    GpuMemUsed(i64),
    /// Anything else is looked up on the record by name.
    Field(String),
}

impl SensorKind {
    pub fn from_key(key: &str) -> SensorKind {
        let gpu_index = |prefix: &str| {
            key.strip_prefix(prefix)
                .and_then(|index| index.parse::<i64>().ok())
        };

        if key == CPU_USAGE {
            SensorKind::CpuUsage
        } else if key == MEMORY_USAGE {
            SensorKind::MemoryUsage
        } else if let Some(index) = gpu_index(GPU_USAGE_PREFIX) {
            SensorKind::GpuUsage(index)
        } else if let Some(index) = gpu_index(GPU_MEMUSAGE_PREFIX) {
            SensorKind::GpuMemUsage(index)
        } else if let Some(index) = gpu_index(GPU_MEMUSED_PREFIX) {
            SensorKind::GpuMemUsed(index)
        } else {
            SensorKind::Field(key.to_string())
        }
    }

    pub fn key(&self) -> String {
        match self {
            SensorKind::CpuUsage => CPU_USAGE.to_string(),
            SensorKind::MemoryUsage => MEMORY_USAGE.to_string(),
            SensorKind::GpuUsage(i) => format!("{}{}", GPU_USAGE_PREFIX, i),
            SensorKind::GpuMemUsage(i) => format!("{}{}", GPU_MEMUSAGE_PREFIX, i),
            SensorKind::GpuMemUsed(i) => format!("{}{}", GPU_MEMUSED_PREFIX, i),
            SensorKind::Field(name) => name.clone(),
        }
    }

    /// Static presentation for this sensor.
    pub fn description(&self) -> EntityDescription {
        let (name, unit, icon) = match self {
            SensorKind::CpuUsage => ("CPU Usage".to_string(), Some(Unit::Percentage), Icon::Chip),
            SensorKind::MemoryUsage => (
                "Memory Usage".to_string(),
                Some(Unit::Percentage),
                Icon::Memory,
            ),
            SensorKind::GpuUsage(i) => (format!("GPU {} Util", i), Some(Unit::Percentage), Icon::Chip),
            SensorKind::GpuMemUsage(i) => {
                (format!("GPU {} Mem", i), Some(Unit::Percentage), Icon::Memory)
            }
            SensorKind::GpuMemUsed(i) => (
                format!("GPU {} Memory Used", i),
                Some(Unit::Megabytes),
                Icon::Memory,
            ),
            SensorKind::Field(name) => (name.clone(), None, Icon::Chip),
        };

        EntityDescription {
            key: self.key(),
            name,
            unit,
            state_class: StateClass::Measurement,
            icon: icon.as_str().to_string(),
            has_entity_name: true,
            suggested_display_precision: DISPLAY_PRECISION,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "%")]
    Percentage,
    #[serde(rename = "MB")]
    Megabytes,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Percentage => "%",
            Unit::Megabytes => "MB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Chip,
    Memory,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Chip => "mdi:chip",
            Icon::Memory => "mdi:memory",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntityDescription {
    pub key: String,
    pub name: String,
    pub unit: Option<Unit>,
    pub state_class: StateClass,
    pub icon: String,
    pub has_entity_name: bool,
    pub suggested_display_precision: u8,
}
