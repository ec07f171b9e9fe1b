//! Percentage thresholds shared by the alert and recommendation rules.
//!
//! All change metrics are expressed in percent, so `20.0` means a 20% move
//! relative to the previous period.

/// CAC growth above this raises an alert and a marketing recommendation.
pub const CAC_INCREASE_PCT: f64 = 20.0;

/// CAC drop below this suggests there is room to spend more on marketing.
pub const CAC_DECREASE_PCT: f64 = -10.0;

/// Revenue growth above this suggests scaling operations.
pub const REVENUE_GROWTH_PCT: f64 = 10.0;

/// Revenue drop below this suggests revisiting the sales strategy.
pub const REVENUE_DECLINE_PCT: f64 = -5.0;
