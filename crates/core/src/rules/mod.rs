pub mod alerts;
pub mod metrics;
pub mod recommendations;
pub mod thresholds;

pub use alerts::generate_alerts;
pub use metrics::compute_metrics;
pub use recommendations::generate_recommendations;
