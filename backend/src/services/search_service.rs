use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use log::{debug, error, info};

use crate::config::API_PAGE_SIZE;
use crate::error::FetchError;
use crate::models::{SearchListResponse, SearchRequest};
use crate::services::youtube_client::{QuotaAwareClient, YouTubeTransport};

/// Lower publish bound `days_ago` days before `now`, second precision, UTC.
/// `None` when the bound falls outside the representable date range.
pub fn published_after(now: DateTime<Utc>, days_ago: i64) -> Option<String> {
    let window = TimeDelta::try_days(days_ago)?;
    now.checked_sub_signed(window)
        .map(|bound| bound.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Page through `search.list` for short videos matching `keyword`, collecting
/// video ids. Failures end pagination early; whatever was collected so far is
/// returned.
pub async fn search_shorts<T: YouTubeTransport>(
    client: &mut QuotaAwareClient<'_, T>,
    keyword: &str,
    days_ago: i64,
    max_pages: u32,
) -> Vec<String> {
    if !client.ensure_session() {
        error!("No valid API key available.");
        return Vec::new();
    }

    let Some(published_after) = published_after(Utc::now(), days_ago) else {
        error!("Search window of {days_ago} days for '{keyword}' is out of range");
        return Vec::new();
    };

    let mut request = SearchRequest {
        query: keyword.to_string(),
        published_after,
        max_results: API_PAGE_SIZE as u32,
        page_token: None,
    };
    let mut video_ids = Vec::new();

    for page in 1..=max_pages {
        let Some(response) = fetch_page(client, &request).await else {
            break;
        };

        let before = video_ids.len();
        video_ids.extend(response.items.into_iter().filter_map(|item| item.id.video_id));
        debug!(
            "Search page {page} for '{keyword}' returned {} ids",
            video_ids.len() - before
        );

        match response.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) => request.page_token = Some(token),
            None => break,
        }
    }

    info!("Search for '{keyword}' found {} videos", video_ids.len());
    video_ids
}

// The same page is retried once after a key rotation so no page is skipped.
async fn fetch_page<T: YouTubeTransport>(
    client: &mut QuotaAwareClient<'_, T>,
    request: &SearchRequest,
) -> Option<SearchListResponse> {
    let result = match client.search_page(request).await {
        Err(FetchError::RecoverableQuota {
            retry_possible: true,
        }) => {
            info!("Retrying search page for '{}' with next key", request.query);
            client.retry_search_page(request).await
        }
        other => other,
    };

    match result {
        Ok(response) => Some(response),
        Err(e) => {
            error!("Search API error for '{}': {e}", request.query);
            None
        }
    }
}
