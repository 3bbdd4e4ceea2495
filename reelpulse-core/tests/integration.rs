//! Integration tests for the reelpulse analytics pipeline
//!
//! These tests go through the SQLite store and [`AnalyticsService`] the same
//! way the CLI does, with data seeded either directly or from dump files.

use chrono::{NaiveDate, TimeZone, Utc};
use reelpulse_core::analytics::{
    build_series, engagement_rate, growth, rank, AnalyticsService, AnalyticsWindow,
    CounterSemantics, GrowthData, GrowthMetric,
};
use reelpulse_core::config::{AnalyticsConfig, ImportConfig};
use reelpulse_core::types::{
    date_key, Campaign, CampaignStatus, DailyPoint, Folder, MetricKey, Metrics, Report, Snapshot,
    VideoRecord,
};
use reelpulse_core::{Database, Importer};
use serde_json::json;
use std::collections::BTreeSet;
use tempfile::TempDir;

const VIEWS: GrowthMetric = GrowthMetric::Metric(MetricKey::Views);

fn test_db() -> Database {
    let db = Database::open_in_memory().expect("in-memory db");
    db.migrate().expect("migrations");
    db
}

fn day(key: &str) -> NaiveDate {
    date_key::parse(key).expect("valid date key")
}

fn campaign(id: &str) -> Campaign {
    Campaign {
        id: id.to_string(),
        name: format!("Campaign {}", id),
        song_name: None,
        artist_name: None,
        status: CampaignStatus::Active,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn snapshot(campaign_id: &str, key: &str, views: u64) -> Snapshot {
    Snapshot {
        campaign_id: campaign_id.to_string(),
        date: day(key),
        metrics: Metrics {
            views,
            likes: views / 10,
            ..Default::default()
        },
        updated_at: Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
    }
}

fn video(campaign_id: &str, post_id: &str, views: u64) -> VideoRecord {
    VideoRecord {
        campaign_id: campaign_id.to_string(),
        post_id: post_id.to_string(),
        video_url: format!("https://example.com/{}", post_id),
        media_url: None,
        posted_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        metrics: Metrics {
            views,
            ..Default::default()
        },
        updated_at: Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
    }
}

fn points(views: &[u64]) -> Vec<DailyPoint> {
    views
        .iter()
        .enumerate()
        .map(|(i, &views)| DailyPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
            metrics: Metrics {
                views,
                ..Default::default()
            },
        })
        .collect()
}

// ============================================
// Growth and engagement
// ============================================

#[test]
fn test_growth_symmetry() {
    let g = growth(&points(&[40, 60, 70, 30]), VIEWS);
    assert_eq!(g.value, 0.0);
    assert!(g.is_positive);
}

#[test]
fn test_growth_from_zero() {
    assert_eq!(
        growth(&points(&[0, 0]), VIEWS),
        GrowthData {
            value: 0.0,
            is_positive: true
        }
    );
    assert_eq!(
        growth(&points(&[0, 5]), VIEWS),
        GrowthData {
            value: 100.0,
            is_positive: true
        }
    );
}

#[test]
fn test_engagement_without_views_is_zero() {
    let totals = Metrics {
        views: 0,
        likes: 12,
        comments: 3,
        ..Default::default()
    };
    let rate = engagement_rate(&totals);
    assert_eq!(rate, 0.0);
    assert!(!rate.is_nan());
}

// ============================================
// Ranking
// ============================================

#[test]
fn test_ranking_is_stable_for_ties() {
    let ranked = rank(
        vec![video("c", "A", 10), video("c", "B", 10), video("c", "C", 20)],
        &BTreeSet::new(),
    );
    let ids: Vec<_> = ranked.iter().map(|v| v.post_id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A", "B"]);
}

#[test]
fn test_hidden_videos_excluded_before_ranking() {
    let db = test_db();
    db.upsert_campaign(&campaign("c1")).unwrap();
    db.upsert_videos(&[video("c1", "A", 5), video("c1", "B", 50)])
        .unwrap();

    let service = AnalyticsService::new(&db, AnalyticsConfig::default());
    let window = AnalyticsWindow::new(30, day("10-01-2024")).unwrap();
    let hidden: BTreeSet<String> = ["B".to_string()].into_iter().collect();

    let analytics = service
        .combined_analytics(&["c1".to_string()], &window, &hidden)
        .unwrap();
    let ids: Vec<_> = analytics
        .video_metrics
        .iter()
        .map(|v| v.post_id.as_str())
        .collect();
    assert_eq!(ids, vec!["A"]);
}

// ============================================
// Aggregation through the store
// ============================================

#[test]
fn test_range_filter_through_store() {
    let db = test_db();
    db.upsert_campaign(&campaign("c1")).unwrap();
    let keys = [
        "07-01-2024", "01-01-2024", "10-01-2024", "03-01-2024", "05-01-2024",
        "09-01-2024", "02-01-2024", "06-01-2024", "04-01-2024", "08-01-2024",
    ];
    for (i, key) in keys.iter().enumerate() {
        db.upsert_snapshot(&snapshot("c1", key, 100 * (i as u64 + 1)))
            .unwrap();
    }

    let service = AnalyticsService::new(&db, AnalyticsConfig::default());
    let window = AnalyticsWindow::new(5, day("10-01-2024")).unwrap();
    let analytics = service.campaign_analytics("c1", &window).unwrap();

    let dates: Vec<_> = analytics
        .daily_data
        .iter()
        .map(|p| date_key::format(p.date))
        .collect();
    assert_eq!(
        dates,
        vec![
            "05-01-2024",
            "06-01-2024",
            "07-01-2024",
            "08-01-2024",
            "09-01-2024",
            "10-01-2024"
        ]
    );
}

#[test]
fn test_multi_campaign_totals_add_latest_rows() {
    let db = test_db();
    db.upsert_campaign(&campaign("a")).unwrap();
    db.upsert_campaign(&campaign("b")).unwrap();
    db.upsert_snapshots(&[
        snapshot("a", "01-01-2024", 60),
        snapshot("a", "02-01-2024", 100),
        snapshot("b", "01-01-2024", 20),
        snapshot("b", "02-01-2024", 50),
    ])
    .unwrap();

    let service = AnalyticsService::new(&db, AnalyticsConfig::default());
    let window = AnalyticsWindow::new(7, day("03-01-2024")).unwrap();
    let ids = vec!["a".to_string(), "b".to_string()];
    let analytics = service
        .combined_analytics(&ids, &window, &BTreeSet::new())
        .unwrap();

    assert_eq!(analytics.totals.views, 150);
    let summed: u64 = analytics.daily_data.iter().map(|p| p.metrics.views).sum();
    assert_eq!(summed, 230);
    assert_ne!(analytics.totals.views, summed);

    // Listing a campaign twice changes nothing
    let twice = vec!["a".to_string(), "b".to_string(), "a".to_string()];
    let again = service
        .combined_analytics(&twice, &window, &BTreeSet::new())
        .unwrap();
    assert_eq!(again.totals.views, 150);
    assert_eq!(again.campaign_ids, ids);
}

#[test]
fn test_daily_counter_semantics_from_config() {
    let db = test_db();
    db.upsert_campaign(&campaign("a")).unwrap();
    db.upsert_snapshots(&[
        snapshot("a", "01-01-2024", 60),
        snapshot("a", "02-01-2024", 100),
    ])
    .unwrap();

    let config = AnalyticsConfig {
        counter_semantics: CounterSemantics::Daily,
        ..Default::default()
    };
    let service = AnalyticsService::new(&db, config);
    let window = AnalyticsWindow::new(7, day("03-01-2024")).unwrap();

    let analytics = service.campaign_analytics("a", &window).unwrap();
    assert_eq!(analytics.totals.views, 160);

    let per_campaign = vec![db.list_snapshots("a").unwrap()];
    let series = build_series(&per_campaign, &window, CounterSemantics::Daily);
    assert_eq!(series.totals, analytics.totals);
}

// ============================================
// Folders, reports, deletion
// ============================================

#[test]
fn test_folder_and_report_analytics() {
    let db = test_db();
    db.upsert_campaign(&campaign("a")).unwrap();
    db.upsert_campaign(&campaign("b")).unwrap();
    db.upsert_snapshots(&[snapshot("a", "05-01-2024", 100), snapshot("b", "05-01-2024", 50)])
        .unwrap();
    db.upsert_videos(&[video("a", "pa", 70), video("b", "pb", 40)])
        .unwrap();
    db.upsert_folder(&Folder {
        id: "f".to_string(),
        name: "All".to_string(),
        created_at: Utc::now(),
        campaign_ids: vec!["a".to_string(), "b".to_string()],
    })
    .unwrap();
    db.upsert_report(&Report {
        id: "r".to_string(),
        name: "Label".to_string(),
        share_token: "tok".to_string(),
        created_at: Utc::now(),
        campaign_ids: vec!["a".to_string(), "b".to_string()],
        hidden_video_ids: ["pa".to_string()].into_iter().collect(),
    })
    .unwrap();

    let service = AnalyticsService::new(&db, AnalyticsConfig::default());
    let window = AnalyticsWindow::new(7, day("06-01-2024")).unwrap();

    let folder = service.folder_analytics("f", &window).unwrap();
    assert_eq!(folder.totals.views, 150);
    assert_eq!(folder.video_metrics.len(), 2);

    let report = service.report_analytics("r", &window).unwrap();
    assert_eq!(report.totals.views, 150);
    let ids: Vec<_> = report.video_metrics.iter().map(|v| v.post_id.as_str()).collect();
    assert_eq!(ids, vec!["pb"]);
}

#[test]
fn test_deleted_campaign_leaves_groups_consistent() {
    let db = test_db();
    db.upsert_campaign(&campaign("a")).unwrap();
    db.upsert_campaign(&campaign("b")).unwrap();
    db.upsert_snapshots(&[snapshot("a", "05-01-2024", 100), snapshot("b", "05-01-2024", 50)])
        .unwrap();
    db.upsert_folder(&Folder {
        id: "f".to_string(),
        name: "All".to_string(),
        created_at: Utc::now(),
        campaign_ids: vec!["a".to_string(), "b".to_string()],
    })
    .unwrap();

    let counts = db.delete_campaign("a").unwrap().expect("campaign existed");
    assert_eq!(counts.snapshots, 1);
    assert_eq!(counts.folder_links, 1);
    assert!(db.delete_campaign("a").unwrap().is_none());

    let service = AnalyticsService::new(&db, AnalyticsConfig::default());
    let window = AnalyticsWindow::new(7, day("06-01-2024")).unwrap();
    let folder = service.folder_analytics("f", &window).unwrap();
    assert_eq!(folder.campaign_ids, vec!["b".to_string()]);
    assert_eq!(folder.totals.views, 50);
}

// ============================================
// Import
// ============================================

#[test]
fn test_imported_dump_feeds_analytics_and_reimport_is_idempotent() {
    let db = test_db();
    let dir = TempDir::new().unwrap();
    let dump = json!({
        "campaigns": [{ "_id": "legacy", "name": "Imported" }],
        "snapshots": [
            { "campaignId": "legacy", "date": "08-01-2024", "views": 100 },
            { "campaignId": "legacy", "date": "09-01-2024", "views": 300 }
        ],
        "videos": [{
            "campaignId": "legacy",
            "postId": "p",
            "videoUrl": "https://example.com/p",
            "postedAt": "2024-01-08T00:00:00Z",
            "views": 80
        }]
    });
    let path = dir.path().join("dump.json");
    std::fs::write(&path, dump.to_string()).unwrap();
    let pattern = format!("{}/*.json", dir.path().display());

    let importer = Importer::new(&db, ImportConfig { batch_size: 1 });
    let first = importer.import_all(&pattern).unwrap();
    assert_eq!(first.files_processed, 1);
    assert_eq!(first.snapshots, 2);
    assert!(first.errors.is_empty());

    let second = importer.import_all(&pattern).unwrap();
    assert_eq!(second.files_processed, 0);
    assert_eq!(second.files_skipped, 1);

    let campaigns = db.list_campaigns().unwrap();
    assert_eq!(campaigns.len(), 1);
    let id = campaigns[0].campaign.id.clone();

    let service = AnalyticsService::new(&db, AnalyticsConfig::default());
    let window = AnalyticsWindow::new(7, day("10-01-2024")).unwrap();
    let analytics = service.campaign_analytics(&id, &window).unwrap();
    assert_eq!(analytics.totals.views, 300);
    assert_eq!(analytics.growth.views.value, 200.0);
    assert_eq!(analytics.video_metrics.len(), 1);
}
