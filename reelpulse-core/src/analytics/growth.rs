//! Growth within a window.
//!
//! The series is bisected at `len / 2` and the second half is compared with
//! the first. The resulting number therefore depends on the window length:
//! over 7 days it is a trend within the week, not week-over-week growth.

use serde::Serialize;

use super::engagement::daily_engagement;
use crate::types::{DailyPoint, MetricKey};

/// What a growth figure is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrowthMetric {
    /// A raw counter, summed per half
    Metric(MetricKey),
    /// Daily engagement rate, averaged per half
    Engagement,
}

impl From<MetricKey> for GrowthMetric {
    fn from(key: MetricKey) -> Self {
        GrowthMetric::Metric(key)
    }
}

/// Growth magnitude and direction, kept apart so presentation can style the
/// sign independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthData {
    /// Absolute percentage, rounded to one decimal
    pub value: f64,
    /// True when the unrounded change is zero or positive
    pub is_positive: bool,
}

impl Default for GrowthData {
    fn default() -> Self {
        Self {
            value: 0.0,
            is_positive: true,
        }
    }
}

impl GrowthData {
    fn from_percent(percent: f64) -> Self {
        Self {
            value: ((percent * 10.0).round() / 10.0).abs(),
            is_positive: percent >= 0.0,
        }
    }

    /// Signed value, e.g. for sorting.
    pub fn signed(&self) -> f64 {
        if self.is_positive {
            self.value
        } else {
            -self.value
        }
    }
}

/// Percentage change from `first` to `second`.
///
/// From zero, any increase counts as 100% and no change as 0%.
pub fn percent_change(first: f64, second: f64) -> f64 {
    if first == 0.0 {
        if second > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (second - first) / first * 100.0
    }
}

/// Growth of `metric` between the two halves of `series`.
///
/// Fewer than two points yield `{ value: 0, is_positive: true }`.
pub fn growth(series: &[DailyPoint], metric: GrowthMetric) -> GrowthData {
    if series.len() < 2 {
        return GrowthData::default();
    }

    let (first, second) = series.split_at(series.len() / 2);
    GrowthData::from_percent(percent_change(
        half_total(first, metric),
        half_total(second, metric),
    ))
}

fn half_total(half: &[DailyPoint], metric: GrowthMetric) -> f64 {
    match metric {
        GrowthMetric::Metric(key) => half.iter().map(|p| p.metrics.get(key) as f64).sum(),
        // Rates don't add up across days, so each half uses its mean
        GrowthMetric::Engagement => {
            let sum: f64 = half.iter().map(|p| daily_engagement(&p.metrics)).sum();
            sum / half.len() as f64
        }
    }
}

/// Growth of every raw counter over one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub views: GrowthData,
    pub likes: GrowthData,
    pub comments: GrowthData,
    pub shares: GrowthData,
    pub saves: GrowthData,
}

impl GrowthSummary {
    pub fn from_series(series: &[DailyPoint]) -> Self {
        let of = |key| growth(series, GrowthMetric::Metric(key));
        Self {
            views: of(MetricKey::Views),
            likes: of(MetricKey::Likes),
            comments: of(MetricKey::Comments),
            shares: of(MetricKey::Shares),
            saves: of(MetricKey::Saves),
        }
    }

    pub fn get(&self, key: MetricKey) -> GrowthData {
        match key {
            MetricKey::Views => self.views,
            MetricKey::Likes => self.likes,
            MetricKey::Comments => self.comments,
            MetricKey::Shares => self.shares,
            MetricKey::Saves => self.saves,
        }
    }
}
