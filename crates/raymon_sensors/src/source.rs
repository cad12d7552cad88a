use raymon_types::NodeRecord;
use std::sync::Arc;

/// Read access to the latest snapshot, as seen by metric readers.
pub trait MetricSource: Send + Sync {
    /// Record for `hostname` from the last successful poll.
    fn current_snapshot(&self, hostname: &str) -> Option<Arc<NodeRecord>>;

    /// Polls that have failed since the last success.
    fn consecutive_failures(&self) -> u32 {
        0
    }
}
