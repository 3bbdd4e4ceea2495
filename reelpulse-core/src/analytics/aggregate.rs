//! Date-windowed aggregation of campaign snapshots.
//!
//! Snapshot counters are cumulative-to-date, so the totals of a campaign are
//! its latest row in the window. Summing the days would count every earlier
//! day again.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::source::AnalyticsSource;
use crate::error::{Error, Result};
use crate::types::{DailyPoint, Metrics, Snapshot, Totals};

/// How stored counters relate to each other across days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterSemantics {
    /// Each row holds totals as of that day; totals are the latest row
    #[default]
    Cumulative,
    /// Each row holds only that day's activity; totals are the sum of rows
    Daily,
}

/// The calendar days an analytics request covers: `[as_of - days, as_of]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsWindow {
    days: u32,
    as_of: NaiveDate,
}

impl AnalyticsWindow {
    /// Create a window of `days` days ending on `as_of`.
    pub fn new(days: u32, as_of: NaiveDate) -> Result<Self> {
        if days == 0 {
            return Err(Error::InvalidWindow(days));
        }
        Ok(Self { days, as_of })
    }

    /// Create a window ending on the current UTC day.
    pub fn ending_today(days: u32) -> Result<Self> {
        Self::new(days, Utc::now().date_naive())
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Last day of the window (inclusive).
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// First day of the window (inclusive).
    pub fn start(&self) -> NaiveDate {
        self.as_of
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.as_of
    }
}

/// Daily series and totals for a set of campaigns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    /// One point per day with data, ascending by date
    pub daily: Vec<DailyPoint>,
    /// Combined counters, see [`CounterSemantics`]
    pub totals: Totals,
    /// Most recent write among the rows in the window
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Read the snapshots of `campaign_ids` and aggregate them over `window`.
///
/// Performs one read per distinct campaign. A campaign listed twice is
/// counted once. Unknown campaigns contribute nothing.
pub fn aggregate<S: AnalyticsSource + ?Sized>(
    source: &S,
    campaign_ids: &[String],
    window: &AnalyticsWindow,
    semantics: CounterSemantics,
) -> Result<Series> {
    let mut seen = HashSet::new();
    let mut per_campaign = Vec::with_capacity(campaign_ids.len());

    for campaign_id in campaign_ids {
        if seen.insert(campaign_id.as_str()) {
            per_campaign.push(source.snapshots(campaign_id)?);
        }
    }

    let series = build_series(&per_campaign, window, semantics);

    tracing::debug!(
        campaigns = per_campaign.len(),
        rows = per_campaign.iter().map(Vec::len).sum::<usize>(),
        days_with_data = series.daily.len(),
        window_days = window.days(),
        as_of = %window.as_of(),
        "Aggregated snapshots"
    );

    Ok(series)
}

/// Aggregate already loaded snapshots, one `Vec` per campaign.
///
/// Rows outside the window are ignored. Rows of different campaigns on the
/// same day are summed into one [`DailyPoint`].
pub fn build_series(
    per_campaign: &[Vec<Snapshot>],
    window: &AnalyticsWindow,
    semantics: CounterSemantics,
) -> Series {
    let mut by_day: BTreeMap<NaiveDate, Metrics> = BTreeMap::new();
    let mut totals = Totals::default();
    let mut last_updated_at: Option<DateTime<Utc>> = None;

    for snapshots in per_campaign {
        let mut latest: Option<&Snapshot> = None;

        for snapshot in snapshots.iter().filter(|s| window.contains(s.date)) {
            *by_day.entry(snapshot.date).or_default() += snapshot.metrics;
            last_updated_at = last_updated_at.max(Some(snapshot.updated_at));

            match semantics {
                CounterSemantics::Cumulative => {
                    let newer = latest.map_or(true, |current| {
                        (snapshot.date, snapshot.updated_at) > (current.date, current.updated_at)
                    });
                    if newer {
                        latest = Some(snapshot);
                    }
                }
                CounterSemantics::Daily => totals += snapshot.metrics,
            }
        }

        if let Some(latest) = latest {
            totals += latest.metrics;
        }
    }

    Series {
        daily: by_day
            .into_iter()
            .map(|(date, metrics)| DailyPoint { date, metrics })
            .collect(),
        totals,
        last_updated_at,
    }
}
