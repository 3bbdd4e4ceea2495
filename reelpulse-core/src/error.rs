//! Error types for reelpulse-core

use thiserror::Error;

/// Main error type for the reelpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A snapshot date that is not a `DD-MM-YYYY` calendar day
    #[error("invalid date key {value:?}: expected DD-MM-YYYY")]
    InvalidDateKey { value: String },

    /// A stored row that cannot be represented by the domain types
    #[error("malformed {table} row: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    /// Analytics window of zero days
    #[error("invalid analytics window: {0} days (must be at least 1)")]
    InvalidWindow(u32),

    /// Campaign not found
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),

    /// Folder not found
    #[error("folder not found: {0}")]
    FolderNotFound(String),

    /// Report not found
    #[error("report not found: {0}")]
    ReportNotFound(String),

    /// Dump import failure for a specific file
    #[error("import error in {path}: {message}")]
    Import { path: String, message: String },

    /// Bad glob pattern for dump discovery
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Result type alias for reelpulse-core
pub type Result<T> = std::result::Result<T, Error>;
