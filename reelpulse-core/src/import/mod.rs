//! Import of legacy JSON dumps into the store
//!
//! ```text
//! ┌────────────┐     ┌──────────┐     ┌──────────────────────┐
//! │ dump files │ ──► │ Importer │ ──► │ Database             │
//! │ (glob)     │     │          │     │ + import_id_map      │
//! └────────────┘     └──────────┘     │ + import_checkpoints │
//!                                     └──────────────────────┘
//! ```
//!
//! Each file is imported section by section (see [`Stage`]) in batches of
//! `import.batch_size` records. Every batch is one transaction that also
//! moves the file's checkpoint forward, so an interrupted import resumes
//! after the last committed batch.
//!
//! Legacy ids are replaced by fresh UUIDs. The mapping is stored, so
//! importing a file again updates the records created the first time.

pub mod dump;

pub use dump::{RawDump, Stage};

use chrono::Utc;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config::ImportConfig;
use crate::db::{Database, ImportCheckpoint};
use crate::error::{Error, Result};
use crate::types::{Campaign, Folder, Report, Snapshot, VideoRecord};
use dump::{DumpCampaign, DumpFolder, DumpReport, DumpSnapshot, DumpVideo};

/// Stage recorded once every section of a file is committed.
const STAGE_COMPLETE: &str = "complete";

const CAMPAIGN_IDS: &str = "campaign";
const FOLDER_IDS: &str = "folder";
const REPORT_IDS: &str = "report";

/// Result of importing every file matching a pattern.
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Files that had records to import
    pub files_processed: usize,
    /// Files already imported with unchanged contents
    pub files_skipped: usize,
    pub campaigns: usize,
    pub snapshots: usize,
    pub videos: usize,
    pub folders: usize,
    pub reports: usize,
    /// Records skipped, with the reason
    pub warnings: Vec<String>,
    /// Files that failed (file path → error message)
    pub errors: Vec<(PathBuf, String)>,
}

/// Result of importing a single file.
#[derive(Debug, Default)]
pub struct FileImportResult {
    pub path: PathBuf,
    /// True when the file was already imported with the same contents
    pub skipped: bool,
    pub campaigns: usize,
    pub snapshots: usize,
    pub videos: usize,
    pub folders: usize,
    pub reports: usize,
    pub warnings: Vec<String>,
}

impl FileImportResult {
    fn count_mut(&mut self, stage: Stage) -> &mut usize {
        match stage {
            Stage::Campaigns => &mut self.campaigns,
            Stage::Snapshots => &mut self.snapshots,
            Stage::Videos => &mut self.videos,
            Stage::Folders => &mut self.folders,
            Stage::Reports => &mut self.reports,
        }
    }
}

/// Imports dump files into a [`Database`].
pub struct Importer<'a> {
    db: &'a Database,
    config: ImportConfig,
}

impl<'a> Importer<'a> {
    pub fn new(db: &'a Database, config: ImportConfig) -> Self {
        Self { db, config }
    }

    /// Files matching `pattern`, sorted by path.
    pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = glob::glob(pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "Unreadable path while discovering dumps");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Import every file matching `pattern`.
    pub fn import_all(&self, pattern: &str) -> Result<ImportResult> {
        self.import_all_with_progress(pattern, |_, _, _| {})
    }

    /// Import every file matching `pattern`, calling
    /// `on_progress(current_file_index, total_files, path)` before each file.
    ///
    /// A failing file is recorded in [`ImportResult::errors`] and the
    /// remaining files are still imported.
    pub fn import_all_with_progress<F>(
        &self,
        pattern: &str,
        mut on_progress: F,
    ) -> Result<ImportResult>
    where
        F: FnMut(usize, usize, &Path),
    {
        let files = Self::discover(pattern)?;
        let total = files.len();
        let mut result = ImportResult::default();

        tracing::info!(pattern, files = total, "Starting dump import");

        for (i, path) in files.iter().enumerate() {
            on_progress(i, total, path);

            match self.import_file(path) {
                Ok(file_result) => Self::update_result(&mut result, file_result),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Dump import failed");
                    result.errors.push((path.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            processed = result.files_processed,
            skipped = result.files_skipped,
            failed = result.errors.len(),
            warnings = result.warnings.len(),
            "Dump import finished"
        );

        Ok(result)
    }

    fn update_result(result: &mut ImportResult, file_result: FileImportResult) {
        if file_result.skipped {
            result.files_skipped += 1;
        } else {
            result.files_processed += 1;
        }
        result.campaigns += file_result.campaigns;
        result.snapshots += file_result.snapshots;
        result.videos += file_result.videos;
        result.folders += file_result.folders;
        result.reports += file_result.reports;
        result.warnings.extend(file_result.warnings);
    }

    /// Import a single dump file, resuming from its checkpoint.
    pub fn import_file(&self, path: &Path) -> Result<FileImportResult> {
        let source_path = path.to_string_lossy().to_string();
        let content = std::fs::read(path)?;
        let file_hash = hex::encode(Sha256::digest(&content));

        let mut result = FileImportResult {
            path: path.to_path_buf(),
            ..Default::default()
        };

        let existing = self.db.get_import_checkpoint(&source_path)?;
        let resume = match existing {
            Some(cp) if cp.file_hash == file_hash => {
                if cp.completed_at.is_some() {
                    tracing::debug!(path = %path.display(), "Dump unchanged since last import, skipping");
                    result.skipped = true;
                    return Ok(result);
                }
                let stage = Stage::parse(&cp.stage).ok_or_else(|| Error::Import {
                    path: source_path.clone(),
                    message: format!("checkpoint has unknown stage {:?}", cp.stage),
                })?;
                tracing::info!(
                    path = %path.display(),
                    stage = stage.as_str(),
                    offset = cp.record_offset,
                    "Resuming interrupted import"
                );
                Some((stage, cp.record_offset))
            }
            Some(_) => {
                tracing::info!(path = %path.display(), "Dump changed since last import, restarting");
                None
            }
            None => None,
        };

        let dump: RawDump = serde_json::from_slice(&content).map_err(|e| Error::Import {
            path: source_path.clone(),
            message: format!("not a dump file: {}", e),
        })?;

        let batch_size = self.config.batch_size.max(1);

        for stage in Stage::ALL {
            let start = match resume {
                Some((resume_stage, _)) if stage_index(stage) < stage_index(resume_stage) => {
                    continue
                }
                Some((resume_stage, offset)) if stage == resume_stage => offset,
                _ => 0,
            };

            let records = dump.section(stage);
            let mut offset = start.min(records.len());

            while offset < records.len() {
                let end = (offset + batch_size).min(records.len());
                let batch = &records[offset..end];

                let (written, warnings) = self.db.with_transaction(|conn| {
                    let mut warnings = Vec::new();
                    let mut written = 0;
                    for (i, record) in batch.iter().enumerate() {
                        match import_record(conn, stage, record)? {
                            None => written += 1,
                            Some(reason) => warnings.push(format!(
                                "{}: {} #{} skipped: {}",
                                source_path,
                                stage.as_str(),
                                offset + i,
                                reason
                            )),
                        }
                    }
                    Database::write_import_checkpoint(
                        conn,
                        &ImportCheckpoint {
                            source_path: source_path.clone(),
                            file_hash: file_hash.clone(),
                            stage: stage.as_str().to_string(),
                            record_offset: end,
                            completed_at: None,
                        },
                    )?;
                    Ok((written, warnings))
                })?;

                for warning in &warnings {
                    tracing::warn!("{}", warning);
                }
                *result.count_mut(stage) += written;
                result.warnings.extend(warnings);
                offset = end;
            }
        }

        self.db.with_transaction(|conn| {
            Database::write_import_checkpoint(
                conn,
                &ImportCheckpoint {
                    source_path: source_path.clone(),
                    file_hash: file_hash.clone(),
                    stage: STAGE_COMPLETE.to_string(),
                    record_offset: 0,
                    completed_at: Some(Utc::now()),
                },
            )
        })?;

        tracing::info!(
            path = %path.display(),
            campaigns = result.campaigns,
            snapshots = result.snapshots,
            videos = result.videos,
            folders = result.folders,
            reports = result.reports,
            warnings = result.warnings.len(),
            "Imported dump"
        );

        Ok(result)
    }
}

fn stage_index(stage: Stage) -> usize {
    Stage::ALL
        .iter()
        .position(|s| *s == stage)
        .unwrap_or(Stage::ALL.len())
}

/// Reason a single record was not imported.
///
/// Database failures abort the batch. Malformed records are skipped.
enum RecordError {
    Skip(String),
    Fatal(Error),
}

impl From<Error> for RecordError {
    fn from(e: Error) -> Self {
        match e {
            Error::MalformedRow { .. } => RecordError::Skip(e.to_string()),
            e => RecordError::Fatal(e),
        }
    }
}

/// Import one record. `Ok(Some(reason))` means the record was skipped.
fn import_record(conn: &Connection, stage: Stage, record: &Value) -> Result<Option<String>> {
    let outcome = match stage {
        Stage::Campaigns => import_campaign(conn, record),
        Stage::Snapshots => import_snapshot(conn, record),
        Stage::Videos => import_video(conn, record),
        Stage::Folders => import_folder(conn, record),
        Stage::Reports => import_report(conn, record),
    };
    match outcome {
        Ok(()) => Ok(None),
        Err(RecordError::Skip(reason)) => Ok(Some(reason)),
        Err(RecordError::Fatal(e)) => Err(e),
    }
}

fn decode<T: DeserializeOwned>(record: &Value) -> std::result::Result<T, RecordError> {
    T::deserialize(record).map_err(|e| RecordError::Skip(e.to_string()))
}

/// New id for `legacy_id`, reusing the one assigned by an earlier import.
fn assign_id(
    conn: &Connection,
    entity_type: &str,
    legacy_id: &str,
) -> std::result::Result<String, RecordError> {
    if let Some(id) = Database::read_mapped_id(conn, entity_type, legacy_id)? {
        return Ok(id);
    }
    let id = uuid::Uuid::new_v4().to_string();
    Database::write_mapped_id(conn, entity_type, legacy_id, &id)?;
    Ok(id)
}

fn campaign_id(conn: &Connection, legacy_id: &str) -> std::result::Result<String, RecordError> {
    Database::read_mapped_id(conn, CAMPAIGN_IDS, legacy_id)?
        .ok_or_else(|| RecordError::Skip(format!("unknown campaign {}", legacy_id)))
}

/// Members whose campaign was imported, in dump order.
fn member_ids(
    conn: &Connection,
    legacy_ids: &[String],
) -> std::result::Result<Vec<String>, RecordError> {
    let mut ids = Vec::with_capacity(legacy_ids.len());
    for legacy_id in legacy_ids {
        match Database::read_mapped_id(conn, CAMPAIGN_IDS, legacy_id)? {
            Some(id) => ids.push(id),
            None => tracing::warn!(campaign = %legacy_id, "Dropping unknown campaign from group"),
        }
    }
    Ok(ids)
}

fn import_campaign(conn: &Connection, record: &Value) -> std::result::Result<(), RecordError> {
    let c: DumpCampaign = decode(record)?;
    let campaign = Campaign {
        id: assign_id(conn, CAMPAIGN_IDS, &c.legacy_id)?,
        name: c.name,
        song_name: c.song_name,
        artist_name: c.artist_name,
        status: c.status,
        created_at: c.created_at.unwrap_or_else(Utc::now),
    };
    Database::write_campaign(conn, &campaign)?;
    Ok(())
}

fn import_snapshot(conn: &Connection, record: &Value) -> std::result::Result<(), RecordError> {
    let s: DumpSnapshot = decode(record)?;
    let snapshot = Snapshot {
        campaign_id: campaign_id(conn, &s.campaign_id)?,
        date: s.date,
        metrics: s.counters.into(),
        updated_at: s.updated_at.unwrap_or_else(Utc::now),
    };
    Database::write_snapshot(conn, &snapshot)?;
    Ok(())
}

fn import_video(conn: &Connection, record: &Value) -> std::result::Result<(), RecordError> {
    let v: DumpVideo = decode(record)?;
    let video = VideoRecord {
        campaign_id: campaign_id(conn, &v.campaign_id)?,
        post_id: v.post_id,
        video_url: v.video_url,
        media_url: v.media_url,
        posted_at: v.posted_at,
        metrics: v.counters.into(),
        updated_at: v.updated_at.unwrap_or_else(Utc::now),
    };
    Database::write_video(conn, &video)?;
    Ok(())
}

fn import_folder(conn: &Connection, record: &Value) -> std::result::Result<(), RecordError> {
    let f: DumpFolder = decode(record)?;
    let folder = Folder {
        id: assign_id(conn, FOLDER_IDS, &f.legacy_id)?,
        name: f.name,
        created_at: f.created_at.unwrap_or_else(Utc::now),
        campaign_ids: member_ids(conn, &f.campaign_ids)?,
    };
    Database::write_folder(conn, &folder)?;
    Ok(())
}

fn import_report(conn: &Connection, record: &Value) -> std::result::Result<(), RecordError> {
    let r: DumpReport = decode(record)?;
    let id = assign_id(conn, REPORT_IDS, &r.legacy_id)?;
    // A token generated on an earlier import stays valid.
    let share_token = match r.share_token {
        Some(token) => token,
        None => Database::read_share_token(conn, &id)?
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string()),
    };
    let report = Report {
        id,
        name: r.name,
        share_token,
        created_at: r.created_at.unwrap_or_else(Utc::now),
        campaign_ids: member_ids(conn, &r.campaign_ids)?,
        hidden_video_ids: r.hidden_video_ids.into_iter().collect(),
    };
    Database::write_report(conn, &report)?;
    Ok(())
}
