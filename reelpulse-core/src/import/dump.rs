//! Records of a legacy JSON dump.
//!
//! A dump is one object with a list per entity:
//!
//! ```json
//! {
//!   "campaigns": [{ "_id": "64f…", "name": "Summer Push", "status": "active" }],
//!   "snapshots": [{ "campaignId": "64f…", "date": "05-01-2024", "views": 1200 }],
//!   "videos":    [{ "campaignId": "64f…", "postId": "731…", "videoUrl": "…", "postedAt": "…" }],
//!   "folders":   [{ "_id": "…", "name": "Q1", "campaignIds": ["64f…"] }],
//!   "reports":   [{ "_id": "…", "name": "Label", "campaignIds": ["64f…"], "hiddenVideoIds": [] }]
//! }
//! ```
//!
//! Sections stay untyped until import so that one bad record is reported and
//! skipped instead of failing the whole file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{date_key, CampaignStatus, Metrics};

/// A dump file with its sections still undecoded.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDump {
    pub campaigns: Vec<Value>,
    pub snapshots: Vec<Value>,
    pub videos: Vec<Value>,
    pub folders: Vec<Value>,
    pub reports: Vec<Value>,
}

impl RawDump {
    /// Records of one section.
    pub fn section(&self, stage: Stage) -> &[Value] {
        match stage {
            Stage::Campaigns => &self.campaigns,
            Stage::Snapshots => &self.snapshots,
            Stage::Videos => &self.videos,
            Stage::Folders => &self.folders,
            Stage::Reports => &self.reports,
        }
    }
}

/// Dump sections in import order.
///
/// Campaigns come first since every other section refers to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Campaigns,
    Snapshots,
    Videos,
    Folders,
    Reports,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Campaigns,
        Stage::Snapshots,
        Stage::Videos,
        Stage::Folders,
        Stage::Reports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Campaigns => "campaigns",
            Stage::Snapshots => "snapshots",
            Stage::Videos => "videos",
            Stage::Folders => "folders",
            Stage::Reports => "reports",
        }
    }

    pub fn parse(s: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.as_str() == s)
    }
}

/// Counters as they appear in dumps; absent ones are zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DumpCounters {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
}

impl From<DumpCounters> for Metrics {
    fn from(c: DumpCounters) -> Self {
        Metrics {
            views: c.views,
            likes: c.likes,
            comments: c.comments,
            shares: c.shares,
            saves: c.saves,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpCampaign {
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub name: String,
    pub song_name: Option<String>,
    pub artist_name: Option<String>,
    #[serde(default)]
    pub status: CampaignStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpSnapshot {
    pub campaign_id: String,
    #[serde(with = "date_key")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counters: DumpCounters,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpVideo {
    pub campaign_id: String,
    pub post_id: String,
    pub video_url: String,
    pub media_url: Option<String>,
    pub posted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub counters: DumpCounters,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpFolder {
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub campaign_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpReport {
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub name: String,
    pub share_token: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub campaign_ids: Vec<String>,
    #[serde(default)]
    pub hidden_video_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::parse("complete"), None);
    }

    #[test]
    fn test_snapshot_defaults_missing_counters() {
        let snapshot: DumpSnapshot = serde_json::from_value(json!({
            "campaignId": "abc",
            "date": "31-12-2023",
            "views": 10
        }))
        .unwrap();
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        let metrics = Metrics::from(snapshot.counters);
        assert_eq!(metrics.views, 10);
        assert_eq!(metrics.saves, 0);
    }

    #[test]
    fn test_snapshot_rejects_iso_date() {
        let result: Result<DumpSnapshot, _> = serde_json::from_value(json!({
            "campaignId": "abc",
            "date": "2023-12-31"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let dump: RawDump = serde_json::from_str(r#"{ "campaigns": [{}] }"#).unwrap();
        assert_eq!(dump.section(Stage::Campaigns).len(), 1);
        assert!(dump.section(Stage::Reports).is_empty());
    }
}
