pub mod coordinator;
pub mod publisher;
pub mod reader;
pub mod source;

pub use coordinator::{ClusterCoordinator, CoordinatorStatus};
pub use publisher::{EntityPublisher, StateStore};
pub use reader::{discover_readers, read_value, MetricReader};
pub use source::MetricSource;
