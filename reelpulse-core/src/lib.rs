//! # reelpulse-core
//!
//! Core library for reelpulse - analytics for song promotion campaigns.
//!
//! This library provides:
//! - Domain types for campaigns, snapshots, videos, folders and reports
//! - Database storage layer with SQLite
//! - The analytics pipeline (aggregation, growth, engagement, video ranking)
//! - Import of legacy JSON dumps
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use reelpulse_core::{AnalyticsService, Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let service = AnalyticsService::new(&db, config.analytics.clone());
//! let window = service.window(Some(7)).expect("valid window");
//! let analytics = service
//!     .campaign_analytics("some-campaign-id", &window)
//!     .expect("analytics");
//! println!("{} views", analytics.totals.views);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsService, AnalyticsSource, AnalyticsWindow, CampaignAnalytics};
pub use config::Config;
pub use db::{CampaignSummary, CascadeReport, Database};
pub use error::{Error, Result};
pub use import::{ImportResult, Importer};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod import;
pub mod logging;
pub mod types;
