//! Core domain types for reelpulse
//!
//! These types represent the canonical data model for campaign analytics.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Campaign** | A promotion of one song, owning snapshots and tracked videos |
//! | **Snapshot** | Cumulative counters for one campaign as of one calendar day |
//! | **VideoRecord** | Latest known counters of one posted video |
//! | **Folder** | A user-defined grouping of campaigns |
//! | **Report** | A shareable view over campaigns that may hide individual videos |
//!
//! Snapshot dates travel as `DD-MM-YYYY` strings at the storage and dump
//! boundary. Everywhere else they are [`NaiveDate`] values, see [`date_key`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::{Add, AddAssign};

// ============================================
// Date keys
// ============================================

/// Conversion between calendar days and their `DD-MM-YYYY` storage keys.
pub mod date_key {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::{Error, Result};

    /// chrono format of a date key
    pub const FORMAT: &str = "%d-%m-%Y";

    /// Parse a `DD-MM-YYYY` key into a calendar day.
    pub fn parse(value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), FORMAT).map_err(|_| Error::InvalidDateKey {
            value: value.to_string(),
        })
    }

    /// Format a calendar day as its `DD-MM-YYYY` key.
    pub fn format(date: NaiveDate) -> String {
        date.format(FORMAT).to_string()
    }

    /// serde `with` adapter for `NaiveDate` fields.
    pub fn serialize<S: Serializer>(
        date: &NaiveDate,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*date))
    }

    /// serde `with` adapter for `NaiveDate` fields.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================
// Metrics
// ============================================

/// One of the raw engagement counters tracked per snapshot and video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Views,
    Likes,
    Comments,
    Shares,
    Saves,
}

impl MetricKey {
    /// All counters, in display order.
    pub const ALL: [MetricKey; 5] = [
        MetricKey::Views,
        MetricKey::Likes,
        MetricKey::Comments,
        MetricKey::Shares,
        MetricKey::Saves,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Views => "views",
            MetricKey::Likes => "likes",
            MetricKey::Comments => "comments",
            MetricKey::Shares => "shares",
            MetricKey::Saves => "saves",
        }
    }
}

impl std::str::FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "views" => Ok(MetricKey::Views),
            "likes" => Ok(MetricKey::Likes),
            "comments" => Ok(MetricKey::Comments),
            "shares" => Ok(MetricKey::Shares),
            "saves" => Ok(MetricKey::Saves),
            _ => Err(format!("unknown metric: {}", s)),
        }
    }
}

/// Engagement counters.
///
/// Used both for a single row (snapshot, video) and for aggregates, where it
/// is referred to as [`Totals`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
}

/// Aggregate counters for a campaign or a set of campaigns.
pub type Totals = Metrics;

impl Metrics {
    /// Read a single counter.
    pub fn get(&self, key: MetricKey) -> u64 {
        match key {
            MetricKey::Views => self.views,
            MetricKey::Likes => self.likes,
            MetricKey::Comments => self.comments,
            MetricKey::Shares => self.shares,
            MetricKey::Saves => self.saves,
        }
    }

    /// Likes + comments + shares + saves.
    pub fn interactions(&self) -> u64 {
        self.likes
            .saturating_add(self.comments)
            .saturating_add(self.shares)
            .saturating_add(self.saves)
    }

    /// True when every counter is zero.
    pub fn is_zero(&self) -> bool {
        *self == Metrics::default()
    }
}

impl Add for Metrics {
    type Output = Metrics;

    fn add(self, rhs: Metrics) -> Metrics {
        Metrics {
            views: self.views.saturating_add(rhs.views),
            likes: self.likes.saturating_add(rhs.likes),
            comments: self.comments.saturating_add(rhs.comments),
            shares: self.shares.saturating_add(rhs.shares),
            saves: self.saves.saturating_add(rhs.saves),
        }
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, rhs: Metrics) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Metrics {
    fn sum<I: Iterator<Item = Metrics>>(iter: I) -> Metrics {
        iter.fold(Metrics::default(), |acc, m| acc + m)
    }
}

// ============================================
// Snapshots
// ============================================

/// Cumulative counters of one campaign as of one calendar day.
///
/// Unique per `(campaign_id, date)`. Later pulls for the same day update the
/// existing row instead of adding a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Owning campaign
    pub campaign_id: String,
    /// Calendar day the counters were observed on
    #[serde(with = "date_key")]
    pub date: NaiveDate,
    /// Counters as of that day
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

/// One point of a daily series: a calendar day and its (possibly merged) counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    #[serde(with = "date_key")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: Metrics,
}

// ============================================
// Videos
// ============================================

/// Latest known counters of a single posted video.
///
/// At most one record exists per `(campaign_id, post_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Owning campaign
    pub campaign_id: String,
    /// External platform post id
    pub post_id: String,
    /// Public URL of the post
    pub video_url: String,
    /// Direct media URL, when the platform exposes one
    pub media_url: Option<String>,
    /// When the video was posted
    pub posted_at: DateTime<Utc>,
    /// Point-in-time counters
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Last refresh time
    pub updated_at: DateTime<Utc>,
}

// ============================================
// Campaigns, folders, reports
// ============================================

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            _ => Err(format!("unknown campaign status: {}", s)),
        }
    }
}

/// A promotion of one song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub song_name: Option<String>,
    pub artist_name: Option<String>,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

/// A user-defined grouping of campaigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Member campaigns, in display order
    pub campaign_ids: Vec<String>,
}

/// A shareable analytics view over a set of campaigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    /// Token used in public share links
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    /// Campaigns included in the report, in display order
    pub campaign_ids: Vec<String>,
    /// Post ids excluded from the report's video list
    pub hidden_video_ids: BTreeSet<String>,
}
