use clap::Parser;
use raymon_settings::config::RaymonConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "raymon")]
#[command(about = "Expose Ray cluster node metrics as sensors", long_about = None)]
pub struct Cli {
    /// Ray dashboard host to register at startup
    #[arg(long)]
    pub host: Option<String>,

    /// Ray dashboard port
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds between polls
    #[arg(long)]
    pub scan_interval: Option<u64>,

    /// Address the HTTP server binds to
    #[arg(long)]
    pub bind: Option<String>,
}

impl Cli {
    /// Command line flags win over the environment.
    pub fn apply(self, mut config: RaymonConfig) -> RaymonConfig {
        if let Some(host) = self.host {
            config.ray_host = Some(host);
        }
        if let Some(port) = self.port {
            config.ray_port = port;
        }
        if let Some(scan_interval) = self.scan_interval {
            config.scan_interval = scan_interval;
        }
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        config
    }
}
