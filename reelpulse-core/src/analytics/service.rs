//! Analytics responses for campaigns, folders and reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use super::aggregate::{aggregate, AnalyticsWindow, Series};
use super::engagement::{engagement_growth, engagement_rate};
use super::growth::{GrowthData, GrowthSummary};
use super::rank::{rank_with, RankOptions};
use super::source::AnalyticsSource;
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::format::format_fixed;
use crate::types::{date_key, DailyPoint, Totals, VideoRecord};

/// Growth with its magnitude formatted to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedGrowth {
    pub value: String,
    pub is_positive: bool,
}

impl From<GrowthData> for FormattedGrowth {
    fn from(growth: GrowthData) -> Self {
        Self {
            value: format_fixed(growth.value, 2),
            is_positive: growth.is_positive,
        }
    }
}

/// Everything shown for a campaign or a group of campaigns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignAnalytics {
    /// Campaigns covered, deduplicated, in request order
    pub campaign_ids: Vec<String>,
    pub window_days: u32,
    #[serde(with = "date_key")]
    pub as_of: NaiveDate,
    pub totals: Totals,
    pub growth: GrowthSummary,
    /// Engagement rate of `totals`, two decimals
    pub engagement_rate: String,
    pub engagement_growth: FormattedGrowth,
    pub daily_data: Vec<DailyPoint>,
    /// Visible videos, most viewed first
    pub video_metrics: Vec<VideoRecord>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl CampaignAnalytics {
    /// Merge the pipeline outputs into one response.
    pub fn assemble(
        campaign_ids: Vec<String>,
        window: &AnalyticsWindow,
        series: Series,
        video_metrics: Vec<VideoRecord>,
    ) -> Self {
        Self {
            campaign_ids,
            window_days: window.days(),
            as_of: window.as_of(),
            growth: GrowthSummary::from_series(&series.daily),
            engagement_rate: format_fixed(engagement_rate(&series.totals), 2),
            engagement_growth: engagement_growth(&series.daily).into(),
            totals: series.totals,
            daily_data: series.daily,
            video_metrics,
            last_updated_at: series.last_updated_at,
        }
    }
}

/// Entry point for analytics requests.
///
/// Holds no state besides the source and configuration; one service can
/// answer any number of requests.
pub struct AnalyticsService<'a, S: AnalyticsSource + ?Sized> {
    source: &'a S,
    config: AnalyticsConfig,
}

impl<'a, S: AnalyticsSource + ?Sized> AnalyticsService<'a, S> {
    pub fn new(source: &'a S, config: AnalyticsConfig) -> Self {
        Self { source, config }
    }

    /// Window ending today, `days` or the configured default long.
    pub fn window(&self, days: Option<u32>) -> Result<AnalyticsWindow> {
        AnalyticsWindow::ending_today(days.unwrap_or(self.config.default_window_days))
    }

    /// Analytics of a single campaign.
    pub fn campaign_analytics(
        &self,
        campaign_id: &str,
        window: &AnalyticsWindow,
    ) -> Result<CampaignAnalytics> {
        self.combined_analytics(&[campaign_id.to_string()], window, &BTreeSet::new())
    }

    /// Analytics of several campaigns combined, leaving out `hidden_video_ids`.
    pub fn combined_analytics(
        &self,
        campaign_ids: &[String],
        window: &AnalyticsWindow,
        hidden_video_ids: &BTreeSet<String>,
    ) -> Result<CampaignAnalytics> {
        let mut campaigns: Vec<String> = Vec::with_capacity(campaign_ids.len());
        for id in campaign_ids {
            if !campaigns.contains(id) {
                campaigns.push(id.clone());
            }
        }

        let series = aggregate(
            self.source,
            &campaigns,
            window,
            self.config.counter_semantics,
        )?;

        let mut videos = Vec::new();
        for campaign_id in &campaigns {
            videos.extend(self.source.videos(campaign_id)?);
        }
        let videos = rank_with(
            videos,
            &RankOptions {
                hidden: hidden_video_ids.clone(),
                limit: self.config.top_videos,
            },
        );

        Ok(CampaignAnalytics::assemble(campaigns, window, series, videos))
    }

    /// Analytics of every campaign in a folder.
    pub fn folder_analytics(
        &self,
        folder_id: &str,
        window: &AnalyticsWindow,
    ) -> Result<CampaignAnalytics> {
        let folder = self
            .source
            .folder(folder_id)?
            .ok_or_else(|| Error::FolderNotFound(folder_id.to_string()))?;
        self.combined_analytics(&folder.campaign_ids, window, &BTreeSet::new())
    }

    /// Analytics of a report, with the report's hidden videos left out.
    pub fn report_analytics(
        &self,
        report_id: &str,
        window: &AnalyticsWindow,
    ) -> Result<CampaignAnalytics> {
        let report = self
            .source
            .report(report_id)?
            .ok_or_else(|| Error::ReportNotFound(report_id.to_string()))?;
        self.combined_analytics(&report.campaign_ids, window, &report.hidden_video_ids)
    }
}
