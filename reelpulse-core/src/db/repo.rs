//! Database repository layer
//!
//! Provides query and insert operations for all entity types.
//!
//! Rows are read into plain column structs first and converted to domain
//! types afterwards, so a malformed row surfaces as [`Error::MalformedRow`]
//! instead of being coerced to a default.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Campaign list entry with row counts, for list views.
#[derive(Debug, Clone)]
pub struct CampaignSummary {
    /// Campaign record
    pub campaign: Campaign,
    /// Number of daily snapshots stored
    pub snapshot_count: i64,
    /// Number of tracked videos
    pub video_count: i64,
    /// Most recent snapshot write
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Counts of rows removed by [`Database::delete_campaign`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub snapshots: usize,
    pub videos: usize,
    pub folder_links: usize,
    pub report_links: usize,
    pub hidden_videos: usize,
}

/// Import bookmark for one dump file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCheckpoint {
    /// Dump file path
    pub source_path: String,
    /// SHA-256 of the file contents when the bookmark was written
    pub file_hash: String,
    /// Section of the dump being imported
    pub stage: String,
    /// Records of `stage` already committed
    pub record_offset: usize,
    /// Set once every stage has been committed
    pub completed_at: Option<DateTime<Utc>>,
}

struct MetricColumns {
    views: i64,
    likes: i64,
    comments: i64,
    shares: i64,
    saves: i64,
}

impl MetricColumns {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            views: row.get("views")?,
            likes: row.get("likes")?,
            comments: row.get("comments")?,
            shares: row.get("shares")?,
            saves: row.get("saves")?,
        })
    }

    fn from_metrics(table: &'static str, metrics: &Metrics) -> Result<Self> {
        let column = |name: &str, value: u64| {
            i64::try_from(value).map_err(|_| Error::MalformedRow {
                table,
                reason: format!("{} counter out of range: {}", name, value),
            })
        };
        Ok(Self {
            views: column("views", metrics.views)?,
            likes: column("likes", metrics.likes)?,
            comments: column("comments", metrics.comments)?,
            shares: column("shares", metrics.shares)?,
            saves: column("saves", metrics.saves)?,
        })
    }

    fn into_metrics(self, table: &'static str) -> Result<Metrics> {
        let counter = |name: &str, value: i64| {
            u64::try_from(value).map_err(|_| Error::MalformedRow {
                table,
                reason: format!("negative {} counter: {}", name, value),
            })
        };
        Ok(Metrics {
            views: counter("views", self.views)?,
            likes: counter("likes", self.likes)?,
            comments: counter("comments", self.comments)?,
            shares: counter("shares", self.shares)?,
            saves: counter("saves", self.saves)?,
        })
    }
}


fn parse_timestamp(table: &'static str, column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::MalformedRow {
            table,
            reason: format!("bad {} timestamp {:?}: {}", column, value, e),
        })
}

struct SnapshotRow {
    campaign_id: String,
    date: String,
    metrics: MetricColumns,
    updated_at: String,
}

impl SnapshotRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            campaign_id: row.get("campaign_id")?,
            date: row.get("date")?,
            metrics: MetricColumns::read(row)?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_snapshot(self) -> Result<Snapshot> {
        let date = date_key::parse(&self.date).map_err(|_| Error::MalformedRow {
            table: "snapshots",
            reason: format!(
                "campaign {} has unparseable date {:?}",
                self.campaign_id, self.date
            ),
        })?;
        Ok(Snapshot {
            metrics: self.metrics.into_metrics("snapshots")?,
            updated_at: parse_timestamp("snapshots", "updated_at", &self.updated_at)?,
            campaign_id: self.campaign_id,
            date,
        })
    }
}

struct VideoRow {
    campaign_id: String,
    post_id: String,
    video_url: String,
    media_url: Option<String>,
    posted_at: String,
    metrics: MetricColumns,
    updated_at: String,
}

impl VideoRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            campaign_id: row.get("campaign_id")?,
            post_id: row.get("post_id")?,
            video_url: row.get("video_url")?,
            media_url: row.get("media_url")?,
            posted_at: row.get("posted_at")?,
            metrics: MetricColumns::read(row)?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_video(self) -> Result<VideoRecord> {
        Ok(VideoRecord {
            metrics: self.metrics.into_metrics("videos")?,
            posted_at: parse_timestamp("videos", "posted_at", &self.posted_at)?,
            updated_at: parse_timestamp("videos", "updated_at", &self.updated_at)?,
            campaign_id: self.campaign_id,
            post_id: self.post_id,
            video_url: self.video_url,
            media_url: self.media_url,
        })
    }
}

struct CampaignRow {
    id: String,
    name: String,
    song_name: Option<String>,
    artist_name: Option<String>,
    status: String,
    created_at: String,
}

impl CampaignRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            song_name: row.get("song_name")?,
            artist_name: row.get("artist_name")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_campaign(self) -> Result<Campaign> {
        let status = self
            .status
            .parse::<CampaignStatus>()
            .map_err(|reason| Error::MalformedRow {
                table: "campaigns",
                reason,
            })?;
        Ok(Campaign {
            created_at: parse_timestamp("campaigns", "created_at", &self.created_at)?,
            id: self.id,
            name: self.name,
            song_name: self.song_name,
            artist_name: self.artist_name,
            status,
        })
    }
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.lock()
    }

    // A panic while holding the lock leaves no partial state behind:
    // every multi-statement write runs in a transaction.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` inside a single transaction, committing when it returns `Ok`.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ============================================
    // Campaign operations
    // ============================================

    /// Insert or update a campaign
    pub fn upsert_campaign(&self, campaign: &Campaign) -> Result<()> {
        let conn = self.lock();
        Self::write_campaign(&conn, campaign)
    }

    pub(crate) fn write_campaign(conn: &Connection, campaign: &Campaign) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO campaigns (id, name, song_name, artist_name, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                song_name = excluded.song_name,
                artist_name = excluded.artist_name,
                status = excluded.status
            "#,
            params![
                campaign.id,
                campaign.name,
                campaign.song_name,
                campaign.artist_name,
                campaign.status.as_str(),
                campaign.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a campaign by ID
    pub fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT * FROM campaigns WHERE id = ?",
                [id],
                CampaignRow::read,
            )
            .optional()?;
        row.map(CampaignRow::into_campaign).transpose()
    }

    /// List campaigns with snapshot / video counts, newest first
    pub fn list_campaigns(&self) -> Result<Vec<CampaignSummary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT c.*,
                (SELECT COUNT(*) FROM snapshots s WHERE s.campaign_id = c.id) AS snapshot_count,
                (SELECT COUNT(*) FROM videos v WHERE v.campaign_id = c.id) AS video_count,
                (SELECT MAX(s.updated_at) FROM snapshots s WHERE s.campaign_id = c.id) AS last_updated_at
            FROM campaigns c
            ORDER BY c.created_at DESC, c.id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    CampaignRow::read(row)?,
                    row.get::<_, i64>("snapshot_count")?,
                    row.get::<_, i64>("video_count")?,
                    row.get::<_, Option<String>>("last_updated_at")?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(campaign, snapshot_count, video_count, last)| {
                Ok(CampaignSummary {
                    campaign: campaign.into_campaign()?,
                    snapshot_count,
                    video_count,
                    last_updated_at: last
                        .map(|ts| parse_timestamp("snapshots", "updated_at", &ts))
                        .transpose()?,
                })
            })
            .collect()
    }

    /// Delete a campaign and everything that references it.
    ///
    /// Removes the campaign's snapshots and videos, drops it from every folder
    /// and report, and un-hides report videos that belonged only to it.
    /// Returns `None` when the campaign does not exist.
    pub fn delete_campaign(&self, id: &str) -> Result<Option<CascadeReport>> {
        let report = self.with_transaction(|conn| {
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM campaigns WHERE id = ?",
                [id],
                |r| r.get(0),
            )?;
            if exists == 0 {
                return Ok(None);
            }

            // Must run before the videos and report links are gone
            let hidden_videos = conn.execute(
                r#"
                DELETE FROM report_hidden_videos
                WHERE report_id IN (SELECT report_id FROM report_campaigns WHERE campaign_id = ?1)
                  AND post_id IN (SELECT post_id FROM videos WHERE campaign_id = ?1)
                  AND NOT EXISTS (
                      SELECT 1
                      FROM report_campaigns rc
                      JOIN videos v ON v.campaign_id = rc.campaign_id
                      WHERE rc.report_id = report_hidden_videos.report_id
                        AND rc.campaign_id != ?1
                        AND v.post_id = report_hidden_videos.post_id
                  )
                "#,
                [id],
            )?;
            let folder_links =
                conn.execute("DELETE FROM folder_campaigns WHERE campaign_id = ?", [id])?;
            let report_links =
                conn.execute("DELETE FROM report_campaigns WHERE campaign_id = ?", [id])?;
            let snapshots = conn.execute("DELETE FROM snapshots WHERE campaign_id = ?", [id])?;
            let videos = conn.execute("DELETE FROM videos WHERE campaign_id = ?", [id])?;
            conn.execute("DELETE FROM campaigns WHERE id = ?", [id])?;

            Ok(Some(CascadeReport {
                snapshots,
                videos,
                folder_links,
                report_links,
                hidden_videos,
            }))
        })?;

        if let Some(ref counts) = report {
            tracing::info!(
                campaign_id = id,
                snapshots = counts.snapshots,
                videos = counts.videos,
                folder_links = counts.folder_links,
                report_links = counts.report_links,
                hidden_videos = counts.hidden_videos,
                "Deleted campaign"
            );
        }

        Ok(report)
    }

    // ============================================
    // Snapshot operations
    // ============================================

    /// Insert a snapshot, or update the counters of the existing row for the same day
    pub fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let conn = self.lock();
        Self::write_snapshot(&conn, snapshot)
    }

    /// Upsert multiple snapshots in a transaction
    pub fn upsert_snapshots(&self, snapshots: &[Snapshot]) -> Result<()> {
        self.with_transaction(|conn| {
            for snapshot in snapshots {
                Self::write_snapshot(conn, snapshot)?;
            }
            Ok(())
        })
    }

    pub(crate) fn write_snapshot(conn: &Connection, snapshot: &Snapshot) -> Result<()> {
        let m = MetricColumns::from_metrics("snapshots", &snapshot.metrics)?;
        conn.execute(
            r#"
            INSERT INTO snapshots (campaign_id, date, views, likes, comments, shares, saves, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(campaign_id, date) DO UPDATE SET
                views = excluded.views,
                likes = excluded.likes,
                comments = excluded.comments,
                shares = excluded.shares,
                saves = excluded.saves,
                updated_at = excluded.updated_at
            "#,
            params![
                snapshot.campaign_id,
                date_key::format(snapshot.date),
                m.views,
                m.likes,
                m.comments,
                m.shares,
                m.saves,
                snapshot.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All snapshots of a campaign, in no particular order
    pub fn list_snapshots(&self, campaign_id: &str) -> Result<Vec<Snapshot>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM snapshots WHERE campaign_id = ?")?;
        let rows = stmt
            .query_map([campaign_id], SnapshotRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(SnapshotRow::into_snapshot).collect()
    }

    // ============================================
    // Video operations
    // ============================================

    /// Insert or refresh a tracked video
    pub fn upsert_video(&self, video: &VideoRecord) -> Result<()> {
        let conn = self.lock();
        Self::write_video(&conn, video)
    }

    /// Upsert multiple videos in a transaction
    pub fn upsert_videos(&self, videos: &[VideoRecord]) -> Result<()> {
        self.with_transaction(|conn| {
            for video in videos {
                Self::write_video(conn, video)?;
            }
            Ok(())
        })
    }

    pub(crate) fn write_video(conn: &Connection, video: &VideoRecord) -> Result<()> {
        let m = MetricColumns::from_metrics("videos", &video.metrics)?;
        conn.execute(
            r#"
            INSERT INTO videos (campaign_id, post_id, video_url, media_url, posted_at,
                                views, likes, comments, shares, saves, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(campaign_id, post_id) DO UPDATE SET
                video_url = excluded.video_url,
                media_url = COALESCE(excluded.media_url, videos.media_url),
                views = excluded.views,
                likes = excluded.likes,
                comments = excluded.comments,
                shares = excluded.shares,
                saves = excluded.saves,
                updated_at = excluded.updated_at
            "#,
            params![
                video.campaign_id,
                video.post_id,
                video.video_url,
                video.media_url,
                video.posted_at.to_rfc3339(),
                m.views,
                m.likes,
                m.comments,
                m.shares,
                m.saves,
                video.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All tracked videos of a campaign, in no particular order
    pub fn list_videos(&self, campaign_id: &str) -> Result<Vec<VideoRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM videos WHERE campaign_id = ?")?;
        let rows = stmt
            .query_map([campaign_id], VideoRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(VideoRow::into_video).collect()
    }

    // ============================================
    // Folder operations
    // ============================================

    /// Insert or update a folder, replacing its campaign membership
    pub fn upsert_folder(&self, folder: &Folder) -> Result<()> {
        self.with_transaction(|conn| Self::write_folder(conn, folder))
    }

    pub(crate) fn write_folder(conn: &Connection, folder: &Folder) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO folders (id, name, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
            params![folder.id, folder.name, folder.created_at.to_rfc3339()],
        )?;
        conn.execute("DELETE FROM folder_campaigns WHERE folder_id = ?", [&folder.id])?;
        for (position, campaign_id) in folder.campaign_ids.iter().enumerate() {
            conn.execute(
                r#"
                INSERT OR IGNORE INTO folder_campaigns (folder_id, campaign_id, position)
                VALUES (?1, ?2, ?3)
                "#,
                params![folder.id, campaign_id, position as i64],
            )?;
        }
        Ok(())
    }

    /// Get a folder with its member campaigns
    pub fn get_folder(&self, id: &str) -> Result<Option<Folder>> {
        let conn = self.lock();
        let header = conn
            .query_row(
                "SELECT id, name, created_at FROM folders WHERE id = ?",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, created_at)) = header else {
            return Ok(None);
        };

        let campaign_ids = Self::member_ids(
            &conn,
            "SELECT campaign_id FROM folder_campaigns WHERE folder_id = ? ORDER BY position",
            &id,
        )?;

        Ok(Some(Folder {
            created_at: parse_timestamp("folders", "created_at", &created_at)?,
            id,
            name,
            campaign_ids,
        }))
    }

    /// List folder ids and names
    pub fn list_folders(&self) -> Result<Vec<(String, String)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM folders ORDER BY name")?;
        let folders = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(folders)
    }

    // ============================================
    // Report operations
    // ============================================

    /// Insert or update a report, replacing its campaigns and hidden videos
    pub fn upsert_report(&self, report: &Report) -> Result<()> {
        self.with_transaction(|conn| Self::write_report(conn, report))
    }

    pub(crate) fn read_share_token(conn: &Connection, report_id: &str) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT share_token FROM reports WHERE id = ?",
                [report_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn write_report(conn: &Connection, report: &Report) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO reports (id, name, share_token, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                share_token = excluded.share_token
            "#,
            params![
                report.id,
                report.name,
                report.share_token,
                report.created_at.to_rfc3339(),
            ],
        )?;
        conn.execute("DELETE FROM report_campaigns WHERE report_id = ?", [&report.id])?;
        for (position, campaign_id) in report.campaign_ids.iter().enumerate() {
            conn.execute(
                r#"
                INSERT OR IGNORE INTO report_campaigns (report_id, campaign_id, position)
                VALUES (?1, ?2, ?3)
                "#,
                params![report.id, campaign_id, position as i64],
            )?;
        }
        conn.execute(
            "DELETE FROM report_hidden_videos WHERE report_id = ?",
            [&report.id],
        )?;
        for post_id in &report.hidden_video_ids {
            conn.execute(
                "INSERT OR IGNORE INTO report_hidden_videos (report_id, post_id) VALUES (?1, ?2)",
                params![report.id, post_id],
            )?;
        }
        Ok(())
    }

    /// Get a report with its campaigns and hidden videos
    pub fn get_report(&self, id: &str) -> Result<Option<Report>> {
        self.find_report("SELECT id, name, share_token, created_at FROM reports WHERE id = ?", id)
    }

    /// Resolve a public share token to its report
    pub fn get_report_by_share_token(&self, token: &str) -> Result<Option<Report>> {
        self.find_report(
            "SELECT id, name, share_token, created_at FROM reports WHERE share_token = ?",
            token,
        )
    }

    fn find_report(&self, sql: &str, key: &str) -> Result<Option<Report>> {
        let conn = self.lock();
        let header = conn
            .query_row(sql, [key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        let Some((id, name, share_token, created_at)) = header else {
            return Ok(None);
        };

        let campaign_ids = Self::member_ids(
            &conn,
            "SELECT campaign_id FROM report_campaigns WHERE report_id = ? ORDER BY position",
            &id,
        )?;
        let hidden_video_ids: BTreeSet<String> = Self::member_ids(
            &conn,
            "SELECT post_id FROM report_hidden_videos WHERE report_id = ?",
            &id,
        )?
        .into_iter()
        .collect();

        Ok(Some(Report {
            created_at: parse_timestamp("reports", "created_at", &created_at)?,
            id,
            name,
            share_token,
            campaign_ids,
            hidden_video_ids,
        }))
    }

    /// List report ids and names
    pub fn list_reports(&self) -> Result<Vec<(String, String)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM reports ORDER BY name")?;
        let reports = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// Hide or un-hide a video in a report. Returns false when nothing changed.
    pub fn set_video_hidden(&self, report_id: &str, post_id: &str, hidden: bool) -> Result<bool> {
        let conn = self.lock();
        let changed = if hidden {
            conn.execute(
                "INSERT OR IGNORE INTO report_hidden_videos (report_id, post_id) VALUES (?1, ?2)",
                params![report_id, post_id],
            )?
        } else {
            conn.execute(
                "DELETE FROM report_hidden_videos WHERE report_id = ?1 AND post_id = ?2",
                params![report_id, post_id],
            )?
        };
        Ok(changed > 0)
    }

    fn member_ids(conn: &Connection, sql: &str, owner_id: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map([owner_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ============================================
    // Import bookkeeping
    // ============================================

    /// Get the import bookmark of a dump file
    pub fn get_import_checkpoint(&self, source_path: &str) -> Result<Option<ImportCheckpoint>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                r#"
                SELECT source_path, file_hash, stage, record_offset, completed_at
                FROM import_checkpoints WHERE source_path = ?
                "#,
                [source_path],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(source_path, file_hash, stage, offset, completed_at)| {
            Ok(ImportCheckpoint {
                source_path,
                file_hash,
                stage,
                record_offset: usize::try_from(offset).map_err(|_| Error::MalformedRow {
                    table: "import_checkpoints",
                    reason: format!("negative record offset: {}", offset),
                })?,
                completed_at: completed_at
                    .map(|ts| parse_timestamp("import_checkpoints", "completed_at", &ts))
                    .transpose()?,
            })
        })
        .transpose()
    }

    pub(crate) fn write_import_checkpoint(
        conn: &Connection,
        checkpoint: &ImportCheckpoint,
    ) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO import_checkpoints (source_path, file_hash, stage, record_offset,
                                            completed_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(source_path) DO UPDATE SET
                file_hash = excluded.file_hash,
                stage = excluded.stage,
                record_offset = excluded.record_offset,
                completed_at = excluded.completed_at,
                updated_at = excluded.updated_at
            "#,
            params![
                checkpoint.source_path,
                checkpoint.file_hash,
                checkpoint.stage,
                checkpoint.record_offset as i64,
                checkpoint.completed_at.map(|t| t.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Look up the id assigned to a legacy dump id
    pub fn get_mapped_id(&self, entity_type: &str, legacy_id: &str) -> Result<Option<String>> {
        let conn = self.lock();
        Self::read_mapped_id(&conn, entity_type, legacy_id)
    }

    pub(crate) fn read_mapped_id(
        conn: &Connection,
        entity_type: &str,
        legacy_id: &str,
    ) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT new_id FROM import_id_map WHERE entity_type = ?1 AND legacy_id = ?2",
                params![entity_type, legacy_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn write_mapped_id(
        conn: &Connection,
        entity_type: &str,
        legacy_id: &str,
        new_id: &str,
    ) -> Result<()> {
        conn.execute(
            r#"
            INSERT OR IGNORE INTO import_id_map (entity_type, legacy_id, new_id)
            VALUES (?1, ?2, ?3)
            "#,
            params![entity_type, legacy_id, new_id],
        )?;
        Ok(())
    }
}
