use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of metric names the rules can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Profit,
    RevenueChange,
    CostChange,
    Cac,
    CacChange,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Profit => "profit",
            Metric::RevenueChange => "revenue_change",
            Metric::CostChange => "cost_change",
            Metric::Cac => "cac",
            Metric::CacChange => "cac_change",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `profit` and `cac` are always computed. A change metric is `None` when
/// there was no usable prior-period figure, which is not the same as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub profit: f64,
    pub cac: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cac_change: Option<f64>,
}

impl MetricsResult {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Profit => Some(self.profit),
            Metric::Cac => Some(self.cac),
            Metric::RevenueChange => self.revenue_change,
            Metric::CostChange => self.cost_change,
            Metric::CacChange => self.cac_change,
        }
    }
}
