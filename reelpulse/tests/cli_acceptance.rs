use chrono::{Days, Utc};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    dumps: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let dumps = base.join("dumps");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        for dir in [&home, &dumps, &xdg_data, &xdg_config, &xdg_state] {
            fs::create_dir_all(dir).expect("failed to create test directory");
        }

        seed_dump(&dumps);

        Self {
            _temp_dir: temp_dir,
            home,
            dumps,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("reelpulse/data.db")
    }

    fn dump_pattern(&self) -> String {
        format!("{}/*.json", self.dumps.display())
    }
}

/// Date key `days_ago` days before today
fn day_key(days_ago: u64) -> String {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(days_ago))
        .expect("date in range")
        .format("%d-%m-%Y")
        .to_string()
}

fn seed_dump(dir: &std::path::Path) {
    let dump = json!({
        "campaigns": [
            { "_id": "c-legacy", "name": "Summer Push", "songName": "Heat", "artistName": "Nova" }
        ],
        "snapshots": [
            { "campaignId": "c-legacy", "date": day_key(3), "views": 1000, "likes": 100 },
            { "campaignId": "c-legacy", "date": day_key(2), "views": 1500, "likes": 120 },
            { "campaignId": "c-legacy", "date": day_key(1), "views": 2500, "likes": 200 },
            { "campaignId": "c-legacy", "date": day_key(0), "views": 4000, "likes": 400, "shares": 40 }
        ],
        "videos": [
            {
                "campaignId": "c-legacy",
                "postId": "post-small",
                "videoUrl": "https://example.com/post-small",
                "postedAt": "2024-01-01T10:00:00Z",
                "views": 300
            },
            {
                "campaignId": "c-legacy",
                "postId": "post-big",
                "videoUrl": "https://example.com/post-big",
                "postedAt": "2024-01-02T10:00:00Z",
                "views": 3000
            }
        ],
        "folders": [
            { "_id": "f-legacy", "name": "Q1", "campaignIds": ["c-legacy"] }
        ],
        "reports": [
            {
                "_id": "r-legacy",
                "name": "Label Report",
                "shareToken": "share-abc",
                "campaignIds": ["c-legacy"],
                "hiddenVideoIds": ["post-big"]
            }
        ]
    });
    fs::write(
        dir.join("dump.json"),
        serde_json::to_vec_pretty(&dump).expect("failed to serialize dump"),
    )
    .expect("failed to write dump fixture");
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let mut command = Command::new(PathBuf::from(assert_cmd::cargo::cargo_bin!("reelpulse")));

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute reelpulse: {e}"))
}

fn render_args(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "reelpulse {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        render_args(args),
        output.status,
        stdout,
        stderr
    );
}

fn run_json(env: &CliTestEnv, args: &[&str]) -> Value {
    let output = run_bin(env, args);
    assert_success(args, &output);
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "reelpulse {} printed invalid JSON: {e}\n{}",
            render_args(args),
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn import(env: &CliTestEnv) -> Output {
    let pattern = env.dump_pattern();
    let args = ["import", pattern.as_str()];
    let output = run_bin(env, &args);
    assert_success(&args, &output);
    output
}

fn only_campaign_id(env: &CliTestEnv) -> String {
    let campaigns = run_json(env, &["campaigns", "--format", "json"]);
    let campaigns = campaigns.as_array().expect("campaign list");
    assert_eq!(campaigns.len(), 1, "expected one imported campaign");
    campaigns[0]["campaign"]["id"]
        .as_str()
        .expect("campaign id")
        .to_string()
}

#[test]
fn import_populates_db_and_skips_unchanged_dump() {
    let env = CliTestEnv::new();

    let first = import(&env);
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.contains("Import complete:"));
    assert!(
        stdout.contains("Snapshots:       4"),
        "expected snapshot count in stdout, got:\n{stdout}"
    );
    assert!(env.db_path().exists(), "database file should exist");

    let second = import(&env);
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(
        stdout.contains("Files skipped:   1"),
        "expected unchanged dump to be skipped, got:\n{stdout}"
    );

    let db = reelpulse_core::Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let campaigns = db.list_campaigns().expect("failed to list campaigns");
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].snapshot_count, 4);
    assert_eq!(campaigns[0].video_count, 2);
}

#[test]
fn campaign_analytics_uses_latest_snapshot_and_ranks_videos() {
    let env = CliTestEnv::new();
    import(&env);
    let id = only_campaign_id(&env);

    let analytics = run_json(&env, &["campaign", &id, "--days", "7", "--format", "json"]);

    assert_eq!(analytics["windowDays"], 7);
    assert_eq!(analytics["totals"]["views"], 4000);
    assert_eq!(analytics["dailyData"].as_array().map(Vec::len), Some(4));
    // (2500 + 4000) vs (1000 + 1500)
    assert_eq!(analytics["growth"]["views"]["value"], 160.0);
    assert_eq!(analytics["growth"]["views"]["isPositive"], true);
    // (400 + 40) / 4000
    assert_eq!(analytics["engagementRate"], "11.00");
    assert_eq!(analytics["videoMetrics"][0]["postId"], "post-big");
    assert_eq!(analytics["videoMetrics"][1]["postId"], "post-small");

    let text = run_bin(&env, &["campaign", &id, "--days", "7"]);
    assert_success(&["campaign", &id, "--days", "7"], &text);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("Summer Push"));
    assert!(stdout.contains("Window: 7 days ending"));
    assert!(stdout.contains("post-big"));
}

#[test]
fn narrow_window_excludes_older_days() {
    let env = CliTestEnv::new();
    import(&env);
    let id = only_campaign_id(&env);

    let analytics = run_json(&env, &["campaign", &id, "--days", "1", "--format", "json"]);

    // today and yesterday only
    assert_eq!(analytics["dailyData"].as_array().map(Vec::len), Some(2));
    assert_eq!(analytics["totals"]["views"], 4000);
}

#[test]
fn report_hides_videos_and_folder_combines_campaigns() {
    let env = CliTestEnv::new();
    import(&env);

    let report = run_json(
        &env,
        &["report", "share-abc", "--token", "--days", "7", "--format", "json"],
    );
    let videos = report["videoMetrics"].as_array().expect("video list");
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["postId"], "post-small");
    assert_eq!(report["totals"]["views"], 4000);

    let folders = run_json(&env, &["folders", "--format", "json"]);
    let folder_id = folders[0]["id"].as_str().expect("folder id").to_string();
    let folder = run_json(&env, &["folder", &folder_id, "--format", "json"]);
    assert_eq!(folder["totals"]["views"], 4000);
    assert_eq!(folder["windowDays"], 30);
}

fn report_post_ids(env: &CliTestEnv, report_id: &str) -> Vec<String> {
    let report = run_json(env, &["report", report_id, "--format", "json"]);
    report["videoMetrics"]
        .as_array()
        .expect("video list")
        .iter()
        .map(|v| v["postId"].as_str().expect("post id").to_string())
        .collect()
}

#[test]
fn hide_video_toggles_report_video_list() {
    let env = CliTestEnv::new();
    import(&env);
    let reports = run_json(&env, &["reports", "--format", "json"]);
    let report_id = reports[0]["id"].as_str().expect("report id").to_string();
    assert_eq!(report_post_ids(&env, &report_id), vec!["post-small"]);

    let args = ["hide-video", report_id.as_str(), "post-small"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Hidden post-small"));
    assert!(report_post_ids(&env, &report_id).is_empty());

    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("already hidden"));

    let args = ["hide-video", report_id.as_str(), "post-big", "--unhide"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Unhidden post-big"));
    assert_eq!(report_post_ids(&env, &report_id), vec!["post-big"]);

    let output = run_bin(&env, &["hide-video", "nope", "post-big"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("report not found"));
}

#[test]
fn combined_hides_requested_posts() {
    let env = CliTestEnv::new();
    import(&env);
    let id = only_campaign_id(&env);

    let analytics = run_json(
        &env,
        &["combined", &id, &id, "--hide", "post-big", "--format", "json"],
    );
    let videos = analytics["videoMetrics"].as_array().expect("video list");
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["postId"], "post-small");
    assert_eq!(analytics["totals"]["views"], 4000);
}

#[test]
fn unknown_ids_fail_with_not_found() {
    let env = CliTestEnv::new();
    import(&env);

    let output = run_bin(&env, &["campaign", "does-not-exist"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("campaign not found"),
        "expected not-found error, got:\n{stderr}"
    );

    let output = run_bin(&env, &["report", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("report not found"));
}

#[test]
fn delete_campaign_cascades() {
    let env = CliTestEnv::new();
    import(&env);
    let id = only_campaign_id(&env);

    let deleted = run_json(&env, &["delete-campaign", &id, "--format", "json"]);
    assert_eq!(deleted["snapshots"], 4);
    assert_eq!(deleted["videos"], 2);
    assert_eq!(deleted["folderLinks"], 1);
    assert_eq!(deleted["reportLinks"], 1);
    assert_eq!(deleted["hiddenVideos"], 1);

    let output = run_bin(&env, &["campaigns"]);
    assert_success(&["campaigns"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No campaigns."));
}
