use crate::domain::{Alert, Metric, MetricsResult};
use crate::rules::thresholds::CAC_INCREASE_PCT;

/// Alerts in rule order: profit first, then CAC growth.
pub fn generate_alerts(metrics: &MetricsResult) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if metrics.profit < 0.0 {
        alerts.push(Alert::warning("A negative profit was recognized"));
    }

    if let Some(change) = metrics.get(Metric::CacChange) {
        if change > CAC_INCREASE_PCT {
            alerts.push(Alert::warning(format!(
                "Customer acquisition costs have increased by {change:.2}%"
            )));
        }
    }

    alerts
}
