use log::{debug, error, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ApiError, FailureClass, FetchError};
use crate::models::{ApiErrorEnvelope, SearchListResponse, SearchRequest, VideoListResponse};
use crate::services::key_manager::CredentialStore;

/// The two Data API v3 calls the pipeline needs.
#[allow(async_fn_in_trait)]
pub trait YouTubeTransport {
    async fn search_videos(
        &self,
        api_key: &str,
        request: &SearchRequest,
    ) -> Result<SearchListResponse, ApiError>;

    async fn list_videos(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<VideoListResponse, ApiError>;
}

impl<T: YouTubeTransport + ?Sized> YouTubeTransport for &T {
    async fn search_videos(
        &self,
        api_key: &str,
        request: &SearchRequest,
    ) -> Result<SearchListResponse, ApiError> {
        (**self).search_videos(api_key, request).await
    }

    async fn list_videos(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<VideoListResponse, ApiError> {
        (**self).list_videos(api_key, video_ids).await
    }
}

pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(ReqwestTransport {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self, resource: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource);
        }
        url
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<R, ApiError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let envelope: ApiErrorEnvelope = serde_json::from_str(&body).unwrap_or_default();
            let reason = envelope.error.reason().to_string();
            let message = if envelope.error.message.is_empty() {
                body
            } else {
                envelope.error.message
            };
            return Err(ApiError::Http {
                status: status.as_u16(),
                reason,
                message,
            });
        }

        Ok(response.json::<R>().await?)
    }
}

impl YouTubeTransport for ReqwestTransport {
    // Documentation: https://developers.google.com/youtube/v3/docs/search/list
    async fn search_videos(
        &self,
        api_key: &str,
        request: &SearchRequest,
    ) -> Result<SearchListResponse, ApiError> {
        let mut query = vec![
            ("part", "id".to_string()),
            ("q", request.query.clone()),
            ("type", "video".to_string()),
            ("videoDuration", "short".to_string()),
            ("publishedAfter", request.published_after.clone()),
            ("maxResults", request.max_results.to_string()),
            ("key", api_key.to_string()),
        ];
        if let Some(token) = &request.page_token {
            query.push(("pageToken", token.clone()));
        }

        self.get_json(self.endpoint("search"), &query).await
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/videos/list
    async fn list_videos(
        &self,
        api_key: &str,
        video_ids: &[String],
    ) -> Result<VideoListResponse, ApiError> {
        let query = [
            ("part", "snippet,contentDetails,statistics".to_string()),
            ("id", video_ids.join(",")),
            ("key", api_key.to_string()),
        ];

        self.get_json(self.endpoint("videos"), &query).await
    }
}

struct Session {
    api_key: String,
}

/// Binds requests to the store's active key and rotates when that key runs
/// out of quota. A request and its retry rotate at most once between them;
/// whether to retry is the caller's decision.
pub struct QuotaAwareClient<'a, T> {
    store: &'a mut CredentialStore,
    transport: T,
    session: Option<Session>,
}

impl<'a, T: YouTubeTransport> QuotaAwareClient<'a, T> {
    pub fn new(store: &'a mut CredentialStore, transport: T) -> Self {
        let mut client = QuotaAwareClient {
            store,
            transport,
            session: None,
        };
        client.ensure_session();
        client
    }

    /// Bind a session to the current key if none is bound yet.
    pub fn ensure_session(&mut self) -> bool {
        if self.session.is_none() {
            self.bind_session();
        }
        self.session.is_some()
    }

    fn bind_session(&mut self) {
        let key = self.store.current();
        self.session = if key.is_empty() {
            None
        } else {
            Some(Session {
                api_key: key.to_string(),
            })
        };
    }

    fn session_key(&mut self) -> Result<String, FetchError> {
        if !self.ensure_session() {
            error!("No valid API key available.");
            return Err(FetchError::NoCredentialAvailable);
        }
        self.session
            .as_ref()
            .map(|s| s.api_key.clone())
            .ok_or(FetchError::NoCredentialAvailable)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn store(&self) -> &CredentialStore {
        &*self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn search_page(
        &mut self,
        request: &SearchRequest,
    ) -> Result<SearchListResponse, FetchError> {
        self.search(request, true).await
    }

    /// Retry of a page that already cost a rotation. A quota failure here is
    /// reported with `retry_possible: false` and leaves the cursor alone.
    pub async fn retry_search_page(
        &mut self,
        request: &SearchRequest,
    ) -> Result<SearchListResponse, FetchError> {
        self.search(request, false).await
    }

    pub async fn video_details(
        &mut self,
        video_ids: &[String],
    ) -> Result<VideoListResponse, FetchError> {
        self.details(video_ids, true).await
    }

    /// Retry counterpart of [`Self::video_details`]; never rotates.
    pub async fn retry_video_details(
        &mut self,
        video_ids: &[String],
    ) -> Result<VideoListResponse, FetchError> {
        self.details(video_ids, false).await
    }

    async fn search(
        &mut self,
        request: &SearchRequest,
        rotate_on_quota: bool,
    ) -> Result<SearchListResponse, FetchError> {
        let key = self.session_key()?;
        debug!(
            "search.list q={:?} pageToken={:?}",
            request.query, request.page_token
        );
        match self.transport.search_videos(&key, request).await {
            Ok(response) => Ok(response),
            Err(e) => Err(self.handle_failure(e, rotate_on_quota)),
        }
    }

    async fn details(
        &mut self,
        video_ids: &[String],
        rotate_on_quota: bool,
    ) -> Result<VideoListResponse, FetchError> {
        let key = self.session_key()?;
        debug!("videos.list for {} ids", video_ids.len());
        match self.transport.list_videos(&key, video_ids).await {
            Ok(response) => Ok(response),
            Err(e) => Err(self.handle_failure(e, rotate_on_quota)),
        }
    }

    fn handle_failure(&mut self, error: ApiError, rotate_on_quota: bool) -> FetchError {
        match error.class() {
            FailureClass::Recoverable if !rotate_on_quota => {
                warn!("Quota exceeded again on retry ({error}), giving up on this request");
                FetchError::RecoverableQuota {
                    retry_possible: false,
                }
            }
            FailureClass::Recoverable => {
                warn!("Quota exceeded ({error}), rotating key...");
                let retry_possible = !self.store.rotate().is_empty();
                self.bind_session();
                if retry_possible {
                    info!(
                        "Session rebound to key index {}",
                        self.store.current_index()
                    );
                }
                FetchError::RecoverableQuota { retry_possible }
            }
            FailureClass::Fatal => FetchError::FatalRequest(error),
        }
    }
}
