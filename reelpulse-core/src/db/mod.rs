//! Database layer for reelpulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for queries
//! - Checkpoint tracking for restartable dump imports

pub mod repo;
pub mod schema;

pub use repo::{CampaignSummary, CascadeReport, Database, ImportCheckpoint};
