//! Engagement rates.
//!
//! Values stay unrounded here; two-decimal formatting happens when a
//! response is assembled.

use super::growth::{growth, GrowthData, GrowthMetric};
use crate::types::{DailyPoint, Metrics, Totals};

/// `(likes + comments + shares + saves) / views * 100`, or 0 without views.
pub fn engagement_rate(totals: &Totals) -> f64 {
    if totals.views == 0 {
        return 0.0;
    }
    totals.interactions() as f64 / totals.views as f64 * 100.0
}

/// Engagement of a single day as used by growth:
/// `(likes + comments + shares) / max(views, 1) * 100`.
pub fn daily_engagement(metrics: &Metrics) -> f64 {
    let interactions = metrics
        .likes
        .saturating_add(metrics.comments)
        .saturating_add(metrics.shares);
    interactions as f64 / metrics.views.max(1) as f64 * 100.0
}

/// Growth of the daily engagement rate across the series.
pub fn engagement_growth(series: &[DailyPoint]) -> GrowthData {
    growth(series, GrowthMetric::Engagement)
}
