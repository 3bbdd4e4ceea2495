//! Text and JSON rendering for CLI output

use reelpulse_core::analytics::CampaignAnalytics;
use reelpulse_core::format::{format_count, format_growth, format_relative_time_opt};
use reelpulse_core::types::{date_key, MetricKey};
use reelpulse_core::{CampaignSummary, CascadeReport, ImportResult};
use serde_json::{json, Value};

/// Videos listed in text output; JSON carries all of them.
const TEXT_VIDEO_LIMIT: usize = 10;

pub fn print_import_result(result: &ImportResult) {
    println!("Import complete:");
    println!("  Files processed: {}", result.files_processed);
    println!("  Files skipped:   {}", result.files_skipped);
    println!("  Campaigns:       {}", result.campaigns);
    println!("  Snapshots:       {}", result.snapshots);
    println!("  Videos:          {}", result.videos);
    println!("  Folders:         {}", result.folders);
    println!("  Reports:         {}", result.reports);

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings ({}):", result.warnings.len());
        for warning in &result.warnings {
            println!("  {}", warning);
        }
    }

    if !result.errors.is_empty() {
        println!();
        println!("Errors ({}):", result.errors.len());
        for (path, error) in &result.errors {
            println!("  {}: {}", path.display(), error);
        }
    }
}

pub fn import_json(result: &ImportResult) -> Value {
    json!({
        "filesProcessed": result.files_processed,
        "filesSkipped": result.files_skipped,
        "campaigns": result.campaigns,
        "snapshots": result.snapshots,
        "videos": result.videos,
        "folders": result.folders,
        "reports": result.reports,
        "warnings": result.warnings,
        "errors": result
            .errors
            .iter()
            .map(|(path, error)| json!({ "path": path.display().to_string(), "error": error }))
            .collect::<Vec<_>>(),
    })
}

pub fn print_campaigns(campaigns: &[CampaignSummary]) {
    if campaigns.is_empty() {
        println!("No campaigns.");
        return;
    }

    println!(
        "{:<36}  {:<24}  {:<9}  {:>9}  {:>6}  UPDATED",
        "ID", "NAME", "STATUS", "SNAPSHOTS", "VIDEOS"
    );
    for summary in campaigns {
        println!(
            "{:<36}  {:<24}  {:<9}  {:>9}  {:>6}  {}",
            summary.campaign.id,
            truncate(&summary.campaign.name, 24),
            summary.campaign.status.as_str(),
            summary.snapshot_count,
            summary.video_count,
            format_relative_time_opt(summary.last_updated_at),
        );
    }
}

pub fn campaigns_json(campaigns: &[CampaignSummary]) -> Value {
    Value::Array(
        campaigns
            .iter()
            .map(|summary| {
                json!({
                    "campaign": summary.campaign,
                    "snapshotCount": summary.snapshot_count,
                    "videoCount": summary.video_count,
                    "lastUpdatedAt": summary.last_updated_at,
                })
            })
            .collect(),
    )
}

pub fn print_named(title: &str, entries: &[(String, String)]) {
    if entries.is_empty() {
        println!("No {}.", title.to_lowercase());
        return;
    }
    println!("{}:", title);
    for (id, name) in entries {
        println!("  {}  {}", id, name);
    }
}

pub fn named_json(entries: &[(String, String)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect(),
    )
}

pub fn print_analytics(title: &str, analytics: &CampaignAnalytics) {
    println!("{}", title);
    println!(
        "Window: {} days ending {}",
        analytics.window_days,
        date_key::format(analytics.as_of)
    );
    println!(
        "Last updated: {}",
        format_relative_time_opt(analytics.last_updated_at)
    );
    println!();

    println!("Totals");
    for key in MetricKey::ALL {
        println!(
            "  {:<10} {:>8}  ({})",
            key.as_str(),
            format_count(analytics.totals.get(key)),
            format_growth(&analytics.growth.get(key)),
        );
    }
    let sign = if analytics.engagement_growth.is_positive {
        '+'
    } else {
        '-'
    };
    println!(
        "  engagement {:>7}%  ({}{}%)",
        analytics.engagement_rate, sign, analytics.engagement_growth.value
    );
    println!();

    if analytics.daily_data.is_empty() {
        println!("No data in this window.");
    } else {
        println!(
            "{:<10}  {:>10}  {:>8}  {:>8}  {:>8}  {:>8}",
            "DATE", "VIEWS", "LIKES", "COMMENTS", "SHARES", "SAVES"
        );
        for point in &analytics.daily_data {
            let m = &point.metrics;
            println!(
                "{:<10}  {:>10}  {:>8}  {:>8}  {:>8}  {:>8}",
                date_key::format(point.date),
                m.views,
                m.likes,
                m.comments,
                m.shares,
                m.saves
            );
        }
    }

    if !analytics.video_metrics.is_empty() {
        println!();
        println!("Top videos");
        for (i, video) in analytics
            .video_metrics
            .iter()
            .take(TEXT_VIDEO_LIMIT)
            .enumerate()
        {
            println!(
                "  {:>2}. {:>8} views  {}  {}",
                i + 1,
                format_count(video.metrics.views),
                video.post_id,
                video.video_url
            );
        }
        let rest = analytics.video_metrics.len().saturating_sub(TEXT_VIDEO_LIMIT);
        if rest > 0 {
            println!("  ... and {} more", rest);
        }
    }
}

pub fn print_cascade(id: &str, counts: &CascadeReport) {
    println!("Deleted campaign {}", id);
    println!("  Snapshots:        {}", counts.snapshots);
    println!("  Videos:           {}", counts.videos);
    println!("  Folder links:     {}", counts.folder_links);
    println!("  Report links:     {}", counts.report_links);
    println!("  Hidden videos:    {}", counts.hidden_videos);
}

pub fn cascade_json(id: &str, counts: &CascadeReport) -> Value {
    json!({
        "campaignId": id,
        "snapshots": counts.snapshots,
        "videos": counts.videos,
        "folderLinks": counts.folder_links,
        "reportLinks": counts.report_links,
        "hiddenVideos": counts.hidden_videos,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
