//! Analytics pipeline for reelpulse
//!
//! Turns stored snapshots and videos into the analytics shown for a
//! campaign, a set of campaigns, a folder or a shared report:
//!
//! ```text
//! AnalyticsSource ──► aggregate ──► Series ──┬─► growth
//!                                           ├─► engagement
//!        videos ──────► rank ───────────────┴─► CampaignAnalytics
//! ```
//!
//! Every stage is a pure function over what the [`AnalyticsSource`] returns.
//! Nothing is cached and nothing is written, so concurrent requests need no
//! coordination. Authorization is the caller's job.

pub mod aggregate;
pub mod engagement;
pub mod growth;
pub mod rank;
pub mod service;
pub mod source;

pub use aggregate::{aggregate, build_series, AnalyticsWindow, CounterSemantics, Series};
pub use engagement::{daily_engagement, engagement_growth, engagement_rate};
pub use growth::{growth, percent_change, GrowthData, GrowthMetric, GrowthSummary};
pub use rank::{filter_hidden, rank, rank_with, RankOptions};
pub use service::{AnalyticsService, CampaignAnalytics, FormattedGrowth};
pub use source::AnalyticsSource;
