//! Read seam between the analytics pipeline and storage.

use crate::db::Database;
use crate::error::Result;
use crate::types::{Folder, Report, Snapshot, VideoRecord};

/// Read access to the rows the analytics pipeline consumes.
///
/// Collections come back complete and unordered; ordering is the pipeline's
/// job. Unknown ids yield empty collections or `None`, not errors. Any error
/// returned here is passed to the caller unchanged.
pub trait AnalyticsSource {
    /// Every snapshot of a campaign
    fn snapshots(&self, campaign_id: &str) -> Result<Vec<Snapshot>>;

    /// Every tracked video of a campaign
    fn videos(&self, campaign_id: &str) -> Result<Vec<VideoRecord>>;

    /// A folder and its member campaigns
    fn folder(&self, folder_id: &str) -> Result<Option<Folder>>;

    /// A report with its campaigns and hidden videos
    fn report(&self, report_id: &str) -> Result<Option<Report>>;
}

impl AnalyticsSource for Database {
    fn snapshots(&self, campaign_id: &str) -> Result<Vec<Snapshot>> {
        self.list_snapshots(campaign_id)
    }

    fn videos(&self, campaign_id: &str) -> Result<Vec<VideoRecord>> {
        self.list_videos(campaign_id)
    }

    fn folder(&self, folder_id: &str) -> Result<Option<Folder>> {
        self.get_folder(folder_id)
    }

    fn report(&self, report_id: &str) -> Result<Option<Report>> {
        self.get_report(report_id)
    }
}
