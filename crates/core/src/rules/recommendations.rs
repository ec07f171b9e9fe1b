use crate::domain::{Metric, MetricsResult};
use crate::rules::thresholds::{
    CAC_DECREASE_PCT, CAC_INCREASE_PCT, REVENUE_DECLINE_PCT, REVENUE_GROWTH_PCT,
};

/// Each group contributes at most one entry; groups are appended in order
/// profit, revenue change, CAC change.
pub fn generate_recommendations(metrics: &MetricsResult) -> Vec<String> {
    [
        profit_advice(metrics.profit),
        metrics.get(Metric::RevenueChange).and_then(revenue_advice),
        metrics.get(Metric::CacChange).and_then(cac_advice),
    ]
    .into_iter()
    .flatten()
    .map(str::to_string)
    .collect()
}

fn profit_advice(profit: f64) -> Option<&'static str> {
    if profit < 0.0 {
        Some("Reduce operating costs")
    } else if profit > 0.0 {
        Some("Reinvest profits to grow the business")
    } else {
        None
    }
}

fn revenue_advice(change: f64) -> Option<&'static str> {
    if change > REVENUE_GROWTH_PCT {
        Some("Increase the scalability of operations")
    } else if change < REVENUE_DECLINE_PCT {
        Some("Review sales strategies.")
    } else {
        None
    }
}

fn cac_advice(change: f64) -> Option<&'static str> {
    if change > CAC_INCREASE_PCT {
        Some("Optimize marketing channels")
    } else if change < CAC_DECREASE_PCT {
        Some("Increase your marketing budget.")
    } else {
        None
    }
}
