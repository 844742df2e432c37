use log::{error, info, warn};

use crate::config::API_PAGE_SIZE;
use crate::error::FetchError;
use crate::models::VideoItem;
use crate::services::youtube_client::{QuotaAwareClient, YouTubeTransport};

/// Fetch snippet, contentDetails and statistics for `video_ids` in batches of
/// at most 50. A batch that keeps failing is dropped; the others still run.
pub async fn get_video_details<T: YouTubeTransport>(
    client: &mut QuotaAwareClient<'_, T>,
    video_ids: &[String],
) -> Vec<VideoItem> {
    if video_ids.is_empty() || !client.ensure_session() {
        return Vec::new();
    }

    let mut results = Vec::with_capacity(video_ids.len());

    for (index, chunk) in video_ids.chunks(API_PAGE_SIZE).enumerate() {
        match fetch_batch(client, chunk).await {
            Ok(items) => results.extend(items),
            Err(FetchError::NoCredentialAvailable) => {
                error!("No valid API key available, stopping detail lookup.");
                break;
            }
            Err(e) => {
                error!("Video details API error for batch {index}: {e}");
            }
        }
    }

    info!(
        "Fetched details for {} of {} videos",
        results.len(),
        video_ids.len()
    );
    results
}

async fn fetch_batch<T: YouTubeTransport>(
    client: &mut QuotaAwareClient<'_, T>,
    chunk: &[String],
) -> Result<Vec<VideoItem>, FetchError> {
    match client.video_details(chunk).await {
        Ok(response) => Ok(response.items),
        Err(FetchError::RecoverableQuota {
            retry_possible: true,
        }) => {
            warn!("Retrying detail batch of {} ids with next key", chunk.len());
            client.retry_video_details(chunk).await.map(|r| r.items)
        }
        Err(e) => Err(e),
    }
}
