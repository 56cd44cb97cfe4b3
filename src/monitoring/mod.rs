pub mod health;
pub mod metrics;

pub use health::{WorkerProbe, WorkerStatus};
pub use metrics::{Metrics, MetricsSnapshot};
