use chrono::Utc;
use log::info;

use crate::models::{EnrichedVideo, FetchSettings, SortKey, SortOrder};
use crate::services::data_processor::filter_and_enrich;
use crate::services::search_service::search_shorts;
use crate::services::video_service::get_video_details;
use crate::services::youtube_client::{QuotaAwareClient, YouTubeTransport};
use crate::utils::{compare_with_order_float, compare_with_order_int};

/// Receives coarse progress updates. Purely advisory.
pub trait ProgressObserver {
    fn on_progress(&self, percent: u8, message: &str);
}

impl<F: Fn(u8, &str)> ProgressObserver for F {
    fn on_progress(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _percent: u8, _message: &str) {}
}

// Maps a single keyword's 0-100 onto its slice of the overall run.
struct KeywordProgress<'a> {
    inner: &'a dyn ProgressObserver,
    index: usize,
    total: usize,
}

impl ProgressObserver for KeywordProgress<'_> {
    fn on_progress(&self, percent: u8, message: &str) {
        let overall = (self.index * 100 + percent as usize) / self.total.max(1);
        self.inner.on_progress(overall.min(100) as u8, message);
    }
}

/// Search, look up details, filter and enrich for one keyword. Never fails;
/// problems along the way show up as fewer results.
pub async fn fetch_and_filter<T: YouTubeTransport>(
    client: &mut QuotaAwareClient<'_, T>,
    keyword: &str,
    settings: &FetchSettings,
    progress: &dyn ProgressObserver,
) -> Vec<EnrichedVideo> {
    progress.on_progress(10, &format!("Searching for '{keyword}'..."));

    let video_ids = search_shorts(client, keyword, settings.days, settings.max_pages).await;
    if video_ids.is_empty() {
        return Vec::new();
    }

    progress.on_progress(
        50,
        &format!("Fetching details for {} videos...", video_ids.len()),
    );
    let raw_items = get_video_details(client, &video_ids).await;

    progress.on_progress(80, "Processing and filtering data...");
    let accepted = filter_and_enrich(raw_items, settings, Utc::now());

    info!("Keyword '{keyword}': {} videos accepted", accepted.len());
    accepted
}

/// Run [`fetch_and_filter`] for each keyword in turn and concatenate.
pub async fn crawl_keywords<T: YouTubeTransport>(
    client: &mut QuotaAwareClient<'_, T>,
    keywords: &[String],
    settings: &FetchSettings,
    progress: &dyn ProgressObserver,
) -> Vec<EnrichedVideo> {
    let mut all_results = Vec::new();

    for (index, keyword) in keywords.iter().enumerate() {
        let scaled = KeywordProgress {
            inner: progress,
            index,
            total: keywords.len(),
        };
        let results = fetch_and_filter(client, keyword, settings, &scaled).await;
        all_results.extend(results);
        scaled.on_progress(100, &format!("Finished '{keyword}'"));
    }

    info!(
        "Crawl of {} keywords completed with {} videos",
        keywords.len(),
        all_results.len()
    );
    all_results
}

/// Stable sort by total or daily views.
pub fn rank_videos(videos: &mut [EnrichedVideo], key: SortKey, order: SortOrder) {
    match key {
        SortKey::TotalViews => videos.sort_by(|a, b| {
            compare_with_order_int(a.video.view_count(), b.video.view_count(), &order)
        }),
        SortKey::DailyViews => {
            videos.sort_by(|a, b| compare_with_order_float(a.daily_views, b.daily_views, &order))
        }
    }
}

/// Whether any video reached ten million views.
pub fn has_viral_hit(videos: &[EnrichedVideo]) -> bool {
    videos.iter().any(|v| v.video.view_count() >= 10_000_000)
}
