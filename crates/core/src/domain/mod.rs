pub mod insight;
pub mod metrics;
pub mod record;

pub use insight::{Alert, AlertKind, PipelineOutput};
pub use metrics::{Metric, MetricsResult};
pub use record::BusinessRecord;
