use crate::domain::{BusinessRecord, Metric, MetricsResult};
use crate::error::{PipelineError, Result};

/// Fails with `NonFiniteMetric` when `profit` or `cac` overflows, since both
/// must always carry a real value.
pub fn compute_metrics(data: &BusinessRecord) -> Result<MetricsResult> {
    // Zero customers yields an explicit zero CAC, unlike the change metrics
    // which are left out when their baseline is zero.
    let cac = if data.customers > 0.0 {
        data.cost / data.customers
    } else {
        0.0
    };

    let previous_cac = match (data.previous_cost, data.previous_customers) {
        (Some(cost), Some(customers)) if customers != 0.0 => Some(cost / customers),
        _ => None,
    };

    Ok(MetricsResult {
        profit: finite(Metric::Profit, data.revenue - data.cost)?,
        cac: finite(Metric::Cac, cac)?,
        revenue_change: percent_change(data.revenue, data.previous_revenue),
        cost_change: percent_change(data.cost, data.previous_cost),
        cac_change: percent_change(cac, previous_cac),
    })
}

fn finite(metric: Metric, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PipelineError::NonFiniteMetric { metric })
    }
}

/// Period-over-period change in percent. `None` without a non-zero baseline.
fn percent_change(current: f64, previous: Option<f64>) -> Option<f64> {
    previous
        .filter(|p| *p != 0.0)
        .map(|p| (current - p) / p * 100.0)
        .filter(|v| v.is_finite())
}
