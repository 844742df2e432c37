use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{
    DEFAULT_DAYS, DEFAULT_LIMIT_PER_KEYWORD, DEFAULT_MAX_DURATION, DEFAULT_MAX_PAGES,
    DEFAULT_MIN_VIEWS,
};

/// On-disk shape of the key checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeyFile {
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default)]
    pub current_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    pub days: i64,
    pub max_pages: u32,
    pub min_views: i64,
    pub max_duration_seconds: i64,
    pub limit_per_keyword: usize,
    pub only_shorts: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            days: *DEFAULT_DAYS,
            max_pages: *DEFAULT_MAX_PAGES,
            min_views: *DEFAULT_MIN_VIEWS,
            max_duration_seconds: *DEFAULT_MAX_DURATION,
            limit_per_keyword: *DEFAULT_LIMIT_PER_KEYWORD,
            only_shorts: true,
        }
    }
}

/// One page of `search.list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub published_after: String,
    pub max_results: u32,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

/// A `videos.list` item with the snippet, contentDetails and statistics parts.
/// Every part is optional; accessors fall back to documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: Option<Snippet>,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, deserialize_with = "counter")]
    pub view_count: Option<String>,
    #[serde(default, deserialize_with = "counter")]
    pub like_count: Option<String>,
    #[serde(default, deserialize_with = "counter")]
    pub comment_count: Option<String>,
}

// The API sends counters as strings; tolerate plain numbers too.
fn counter<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_counter(raw: Option<&String>, field: &str) -> i64 {
    match raw {
        None => 0,
        Some(s) => s.trim().parse().unwrap_or_else(|_| {
            log::debug!("Unparsable {field} {s:?}, using 0");
            0
        }),
    }
}

impl VideoItem {
    pub fn title(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or("")
    }

    pub fn channel_title(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.channel_title.as_deref())
            .unwrap_or("")
    }

    pub fn channel_id(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.channel_id.as_deref())
            .unwrap_or("")
    }

    pub fn published_at(&self) -> &str {
        self.snippet
            .as_ref()
            .and_then(|s| s.published_at.as_deref())
            .unwrap_or("")
    }

    /// Raw ISO-8601 duration, `PT0S` when absent.
    pub fn duration(&self) -> &str {
        self.content_details
            .as_ref()
            .and_then(|d| d.duration.as_deref())
            .unwrap_or("PT0S")
    }

    pub fn view_count(&self) -> i64 {
        parse_counter(
            self.statistics.as_ref().and_then(|s| s.view_count.as_ref()),
            "viewCount",
        )
    }

    pub fn like_count(&self) -> i64 {
        parse_counter(
            self.statistics.as_ref().and_then(|s| s.like_count.as_ref()),
            "likeCount",
        )
    }

    pub fn comment_count(&self) -> i64 {
        parse_counter(
            self.statistics.as_ref().and_then(|s| s.comment_count.as_ref()),
            "commentCount",
        )
    }

    /// Medium thumbnail, falling back to high and then default.
    pub fn thumbnail_url(&self) -> Option<&str> {
        let thumbs = self.snippet.as_ref()?.thumbnails.as_ref()?;
        thumbs
            .medium
            .as_ref()
            .or(thumbs.high.as_ref())
            .or(thumbs.default.as_ref())
            .map(|t| t.url.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    None,
    Single,
    Double,
    Triple,
}

impl Rating {
    pub fn marker(&self) -> &'static str {
        match self {
            Rating::None => "",
            Rating::Single => "🔥",
            Rating::Double => "🔥🔥",
            Rating::Triple => "🔥🔥🔥",
        }
    }
}

/// An accepted video together with its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedVideo {
    #[serde(flatten)]
    pub video: VideoItem,
    pub daily_views: f64,
    pub rating: Rating,
    pub duration_seconds: i64,
    pub formatted_duration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    TotalViews,
    DailyViews,
}

/// Google API error envelope.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorEnvelope {
    #[serde(default)]
    pub error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

impl ApiErrorBody {
    pub fn reason(&self) -> &str {
        self.errors
            .first()
            .or(self.details.first())
            .map(|d| d.reason.as_str())
            .unwrap_or("")
    }
}
