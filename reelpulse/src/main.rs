//! reelpulse - campaign analytics from the command line
//!
//! Commands:
//! - Importing legacy JSON dumps
//! - Listing campaigns, folders and reports
//! - Showing analytics for a campaign, a set of campaigns, a folder or a report
//! - Hiding report videos and deleting campaigns
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/reelpulse/data.db (~/.local/share/reelpulse/data.db)
//! - Config: $XDG_CONFIG_HOME/reelpulse/config.toml (~/.config/reelpulse/config.toml)
//! - Logs: $XDG_STATE_HOME/reelpulse/ (~/.local/state/reelpulse/)

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use reelpulse_core::analytics::AnalyticsService;
use reelpulse_core::{Config, Database, Error, Importer};
use std::collections::BTreeSet;

#[derive(Parser)]
#[command(name = "reelpulse")]
#[command(about = "Campaign analytics for posted song videos")]
#[command(version)]
struct Args {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Import legacy JSON dumps matching a glob pattern
    Import {
        /// Glob pattern, e.g. "dumps/*.json"
        pattern: String,
    },

    /// List campaigns
    Campaigns,

    /// List folders
    Folders,

    /// List reports
    Reports,

    /// Show analytics for one campaign
    Campaign {
        id: String,

        /// Window length in days (default: from config)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show combined analytics for several campaigns
    Combined {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Window length in days (default: from config)
        #[arg(short, long)]
        days: Option<u32>,

        /// Post id to leave out of the video list (repeatable)
        #[arg(long = "hide")]
        hide: Vec<String>,
    },

    /// Show combined analytics for the campaigns of a folder
    Folder {
        id: String,

        /// Window length in days (default: from config)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show analytics for a report
    Report {
        /// Report id, or share token with --token
        id: String,

        /// Look the report up by its share token
        #[arg(long)]
        token: bool,

        /// Window length in days (default: from config)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Hide a video from a report's video list
    HideVideo {
        report_id: String,
        post_id: String,

        /// Show the video again instead
        #[arg(long)]
        unhide: bool,
    },

    /// Delete a campaign with its snapshots, videos and memberships
    DeleteCampaign { id: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        reelpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = Config::database_path();
    tracing::debug!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run migrations")?;

    let format = args.format;
    match args.command {
        Command::Import { pattern } => cmd_import(&db, &config, &pattern, format),
        Command::Campaigns => cmd_campaigns(&db, format),
        Command::Folders => cmd_folders(&db, format),
        Command::Reports => cmd_reports(&db, format),
        Command::Campaign { id, days } => {
            cmd_combined(&db, &config, &[id], days, Vec::new(), format)
        }
        Command::Combined { ids, days, hide } => {
            cmd_combined(&db, &config, &ids, days, hide, format)
        }
        Command::Folder { id, days } => cmd_folder(&db, &config, &id, days, format),
        Command::Report { id, token, days } => cmd_report(&db, &config, &id, token, days, format),
        Command::HideVideo {
            report_id,
            post_id,
            unhide,
        } => cmd_hide_video(&db, &report_id, &post_id, !unhide),
        Command::DeleteCampaign { id } => cmd_delete_campaign(&db, &id, format),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

fn cmd_import(db: &Database, config: &Config, pattern: &str, format: OutputFormat) -> Result<()> {
    let importer = Importer::new(db, config.import.clone());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("#>-"),
    );
    if format == OutputFormat::Json {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let result = importer
        .import_all_with_progress(pattern, |current, total, path| {
            if current == 0 {
                pb.set_length(total as u64);
            }
            pb.set_position(current as u64);
            pb.set_message(
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("...")
                    .to_string(),
            );
        })
        .context("import failed")?;

    pb.finish_and_clear();

    match format {
        OutputFormat::Json => print_json(&output::import_json(&result))?,
        OutputFormat::Text => output::print_import_result(&result),
    }

    if !result.errors.is_empty() {
        anyhow::bail!("{} file(s) failed to import", result.errors.len());
    }
    Ok(())
}

fn cmd_campaigns(db: &Database, format: OutputFormat) -> Result<()> {
    let campaigns = db.list_campaigns().context("failed to list campaigns")?;
    match format {
        OutputFormat::Json => print_json(&output::campaigns_json(&campaigns)),
        OutputFormat::Text => {
            output::print_campaigns(&campaigns);
            Ok(())
        }
    }
}

fn cmd_folders(db: &Database, format: OutputFormat) -> Result<()> {
    let folders = db.list_folders().context("failed to list folders")?;
    match format {
        OutputFormat::Json => print_json(&output::named_json(&folders)),
        OutputFormat::Text => {
            output::print_named("Folders", &folders);
            Ok(())
        }
    }
}

fn cmd_reports(db: &Database, format: OutputFormat) -> Result<()> {
    let reports = db.list_reports().context("failed to list reports")?;
    match format {
        OutputFormat::Json => print_json(&output::named_json(&reports)),
        OutputFormat::Text => {
            output::print_named("Reports", &reports);
            Ok(())
        }
    }
}

/// Campaign names for display; unknown ids are an error.
fn campaign_names(db: &Database, ids: &[String]) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(ids.len());
    for id in ids {
        let campaign = db
            .get_campaign(id)?
            .ok_or_else(|| Error::CampaignNotFound(id.clone()))?;
        names.push(campaign.name);
    }
    Ok(names)
}

fn cmd_combined(
    db: &Database,
    config: &Config,
    ids: &[String],
    days: Option<u32>,
    hide: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let names = campaign_names(db, ids)?;
    let service = AnalyticsService::new(db, config.analytics.clone());
    let window = service.window(days)?;
    let hidden: BTreeSet<String> = hide.into_iter().collect();

    let analytics = service
        .combined_analytics(ids, &window, &hidden)
        .context("failed to compute analytics")?;

    match format {
        OutputFormat::Json => print_json(&analytics),
        OutputFormat::Text => {
            output::print_analytics(&names.join(" + "), &analytics);
            Ok(())
        }
    }
}

fn cmd_folder(
    db: &Database,
    config: &Config,
    id: &str,
    days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let service = AnalyticsService::new(db, config.analytics.clone());
    let window = service.window(days)?;
    let analytics = service.folder_analytics(id, &window)?;

    match format {
        OutputFormat::Json => print_json(&analytics),
        OutputFormat::Text => {
            let title = db
                .get_folder(id)?
                .map(|f| format!("Folder {}", f.name))
                .unwrap_or_else(|| id.to_string());
            output::print_analytics(&title, &analytics);
            Ok(())
        }
    }
}

fn cmd_report(
    db: &Database,
    config: &Config,
    id: &str,
    by_token: bool,
    days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let report = if by_token {
        db.get_report_by_share_token(id)?
    } else {
        db.get_report(id)?
    }
    .ok_or_else(|| Error::ReportNotFound(id.to_string()))?;

    let service = AnalyticsService::new(db, config.analytics.clone());
    let window = service.window(days)?;
    let analytics = service.report_analytics(&report.id, &window)?;

    match format {
        OutputFormat::Json => print_json(&analytics),
        OutputFormat::Text => {
            output::print_analytics(&format!("Report {}", report.name), &analytics);
            Ok(())
        }
    }
}

fn cmd_hide_video(db: &Database, report_id: &str, post_id: &str, hidden: bool) -> Result<()> {
    let report = db
        .get_report(report_id)?
        .ok_or_else(|| Error::ReportNotFound(report_id.to_string()))?;

    let changed = db.set_video_hidden(&report.id, post_id, hidden)?;
    match (hidden, changed) {
        (true, true) => println!("Hidden {} in report {}", post_id, report.name),
        (true, false) => println!("{} is already hidden in report {}", post_id, report.name),
        (false, true) => println!("Unhidden {} in report {}", post_id, report.name),
        (false, false) => println!("{} is not hidden in report {}", post_id, report.name),
    }
    Ok(())
}

fn cmd_delete_campaign(db: &Database, id: &str, format: OutputFormat) -> Result<()> {
    let counts = db
        .delete_campaign(id)?
        .ok_or_else(|| Error::CampaignNotFound(id.to_string()))?;

    match format {
        OutputFormat::Json => print_json(&output::cascade_json(id, &counts)),
        OutputFormat::Text => {
            output::print_cascade(id, &counts);
            Ok(())
        }
    }
}
