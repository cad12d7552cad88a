use raymon_error::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::env;
use std::time::Duration;

pub const DOMAIN: &str = "ray_cluster";
pub const DEFAULT_PORT: u16 = 8265;
pub const DEFAULT_SCAN_INTERVAL: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;
pub const SUMMARY_PATH: &str = "nodes?view=summary";

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL
}

/// Where a Ray dashboard lives and how often to poll it.
///
/// Built once from user input at setup time. Changing any field means
/// removing the entry and running setup again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl ClusterEndpoint {
    pub fn new(host: &str, port: u16, scan_interval: u64) -> Self {
        Self {
            host: host.to_string(),
            port,
            scan_interval,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn summary_url(&self) -> String {
        format!("{}/{}", self.base_url(), SUMMARY_PATH)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    pub fn title(&self) -> String {
        format!("Ray {}", self.host)
    }

    /// Identity of the cluster behind this endpoint; one entry per `host:port`.
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.host.trim().to_lowercase(), self.port)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::Error("host is required".to_string()));
        }

        if self.port == 0 {
            return Err(SettingsError::Error("port must be non-zero".to_string()));
        }

        if self.scan_interval == 0 {
            return Err(SettingsError::Error(
                "scan_interval must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}

/// Main configuration for the raymon server, read from the environment.
#[derive(Debug, Clone)]
pub struct RaymonConfig {
    pub app_name: String,
    pub app_env: String,
    pub app_version: String,
    pub bind_addr: String,
    pub ray_host: Option<String>,
    pub ray_port: u16,
    pub scan_interval: u64,
    pub request_timeout: u64,
    pub max_stale_polls: u32,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for RaymonConfig {
    fn default() -> Self {
        RaymonConfig {
            app_name: "raymon".to_string(),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            bind_addr: env::var("RAYMON_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            ray_host: env::var("RAY_HOST").ok().filter(|h| !h.trim().is_empty()),
            ray_port: env_or("RAY_PORT", DEFAULT_PORT),
            scan_interval: env_or("RAY_SCAN_INTERVAL", DEFAULT_SCAN_INTERVAL),
            request_timeout: env_or("RAYMON_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT),
            max_stale_polls: env_or("RAYMON_MAX_STALE_POLLS", 1),
        }
    }
}

impl RaymonConfig {
    pub fn new() -> Self {
        RaymonConfig::default()
    }

    /// Endpoint configured through the environment, if a host was given.
    pub fn startup_endpoint(&self) -> Option<ClusterEndpoint> {
        self.ray_host
            .as_ref()
            .map(|host| ClusterEndpoint::new(host, self.ray_port, self.scan_interval))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
