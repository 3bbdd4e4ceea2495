//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: campaigns, metrics and groupings
    r#"
    -- ============================================
    -- Campaigns and their metrics
    -- ============================================

    CREATE TABLE IF NOT EXISTS campaigns (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        song_name        TEXT,
        artist_name      TEXT,
        status           TEXT NOT NULL DEFAULT 'active',
        created_at       DATETIME NOT NULL
    );

    -- One row per campaign per calendar day, counters cumulative-to-date.
    -- `date` is the DD-MM-YYYY key; it is never compared as a string.
    CREATE TABLE IF NOT EXISTS snapshots (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        campaign_id      TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
        date             TEXT NOT NULL,
        views            INTEGER NOT NULL DEFAULT 0,
        likes            INTEGER NOT NULL DEFAULT 0,
        comments         INTEGER NOT NULL DEFAULT 0,
        shares           INTEGER NOT NULL DEFAULT 0,
        saves            INTEGER NOT NULL DEFAULT 0,
        updated_at       DATETIME NOT NULL,

        UNIQUE(campaign_id, date)
    );

    CREATE TABLE IF NOT EXISTS videos (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        campaign_id      TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
        post_id          TEXT NOT NULL,
        video_url        TEXT NOT NULL,
        media_url        TEXT,
        posted_at        DATETIME NOT NULL,
        views            INTEGER NOT NULL DEFAULT 0,
        likes            INTEGER NOT NULL DEFAULT 0,
        comments         INTEGER NOT NULL DEFAULT 0,
        shares           INTEGER NOT NULL DEFAULT 0,
        saves            INTEGER NOT NULL DEFAULT 0,
        updated_at       DATETIME NOT NULL,

        UNIQUE(campaign_id, post_id)
    );

    -- ============================================
    -- Folders and shareable reports
    -- ============================================

    CREATE TABLE IF NOT EXISTS folders (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS folder_campaigns (
        folder_id        TEXT NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
        campaign_id      TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
        position         INTEGER NOT NULL,

        PRIMARY KEY (folder_id, campaign_id)
    );

    CREATE TABLE IF NOT EXISTS reports (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        share_token      TEXT NOT NULL UNIQUE,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS report_campaigns (
        report_id        TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
        campaign_id      TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
        position         INTEGER NOT NULL,

        PRIMARY KEY (report_id, campaign_id)
    );

    CREATE TABLE IF NOT EXISTS report_hidden_videos (
        report_id        TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
        post_id          TEXT NOT NULL,

        PRIMARY KEY (report_id, post_id)
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_snapshots_campaign ON snapshots(campaign_id);
    CREATE INDEX IF NOT EXISTS idx_videos_campaign ON videos(campaign_id);
    CREATE INDEX IF NOT EXISTS idx_videos_post ON videos(post_id);
    CREATE INDEX IF NOT EXISTS idx_folder_campaigns_campaign ON folder_campaigns(campaign_id);
    CREATE INDEX IF NOT EXISTS idx_report_campaigns_campaign ON report_campaigns(campaign_id);
    "#,
    // Version 2: dump import bookkeeping
    r#"
    -- Offset bookmark per dump file. A matching file_hash resumes at
    -- (stage, record_offset); a different hash starts the file over.
    CREATE TABLE IF NOT EXISTS import_checkpoints (
        source_path      TEXT PRIMARY KEY,
        file_hash        TEXT NOT NULL,
        stage            TEXT NOT NULL,
        record_offset    INTEGER NOT NULL DEFAULT 0,
        completed_at     DATETIME,
        updated_at       DATETIME NOT NULL
    );

    -- Legacy dump ids mapped to the ids assigned on import
    CREATE TABLE IF NOT EXISTS import_id_map (
        entity_type      TEXT NOT NULL,
        legacy_id        TEXT NOT NULL,
        new_id           TEXT NOT NULL,

        PRIMARY KEY (entity_type, legacy_id)
    );
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
