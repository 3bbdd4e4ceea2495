//! Top-content ranking of tracked videos.

use std::collections::BTreeSet;

use crate::types::VideoRecord;

/// Options for [`rank_with`].
#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    /// Post ids to leave out
    pub hidden: BTreeSet<String>,
    /// Keep only the first N after ranking
    pub limit: Option<usize>,
}

/// Drop videos whose post id is hidden.
pub fn filter_hidden(mut videos: Vec<VideoRecord>, hidden: &BTreeSet<String>) -> Vec<VideoRecord> {
    if !hidden.is_empty() {
        videos.retain(|v| !hidden.contains(&v.post_id));
    }
    videos
}

/// Hidden videos removed, the rest by views descending.
///
/// The sort is stable: videos with equal views keep their input order.
pub fn rank(videos: Vec<VideoRecord>, hidden: &BTreeSet<String>) -> Vec<VideoRecord> {
    // Hidden videos must not take up ranks
    let mut visible = filter_hidden(videos, hidden);
    visible.sort_by(|a, b| b.metrics.views.cmp(&a.metrics.views));
    visible
}

/// [`rank`] followed by an optional top-N cut.
pub fn rank_with(videos: Vec<VideoRecord>, options: &RankOptions) -> Vec<VideoRecord> {
    let mut ranked = rank(videos, &options.hidden);
    if let Some(limit) = options.limit {
        ranked.truncate(limit);
    }
    ranked
}
