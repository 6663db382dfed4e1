//! YouTube Data API connector implementation
//!
//! Implements the `VideoHostingApi` trait for YouTube Data API v3. Listing
//! reads go through the transport's retry policy for 5xx/429 responses.
//! Inserts, updates and thumbnail uploads are sent once, so a lost response
//! never duplicates a video. Quota failures are a 403 and never retried.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::video::{RemoteChannel, RemoteVideo, VideoHostingApi, VideoMetadata};
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{classify_remote_error, YouTubeError};
use crate::types::{
    ChannelListResponse, PlaylistItemListResponse, VideoListResponse, VideoResource, VideoUpsert,
};

/// YouTube Data API base URL
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Media upload base URL
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// Page size for `playlistItems.list` and id batch size for `videos.list`
const MAX_RESULTS: usize = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// YouTube Data API connector
///
/// The access token is supplied per call, so one connector serves every
/// account.
///
/// # Example
///
/// ```ignore
/// use provider_youtube::YouTubeConnector;
/// use bridge_traits::video::VideoHostingApi;
///
/// let connector = YouTubeConnector::new(http_client);
/// let channels = connector.list_my_channels(&credential.access_token).await?;
/// ```
pub struct YouTubeConnector {
    http_client: Arc<dyn HttpClient>,
    api_base: String,
    upload_base: String,
    upload_timeout: Duration,
}

impl YouTubeConnector {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Timeout applied to the media upload request only.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Point the connector at another host (local emulators).
    pub fn with_base_urls(mut self, api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self
    }

    fn request(&self, method: HttpMethod, url: String, access_token: &str) -> HttpRequest {
        HttpRequest::new(method, url)
            .bearer_token(access_token)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    /// Executes once and turns any non-2xx status into a classified error.
    async fn send(&self, request: HttpRequest) -> crate::Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        Self::check(response)
    }

    /// Like [`Self::send`] but lets the transport retry. Reads only.
    async fn send_idempotent(&self, request: HttpRequest) -> crate::Result<HttpResponse> {
        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::default())
            .await?;
        Self::check(response)
    }

    fn check(response: HttpResponse) -> crate::Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let error = classify_remote_error(response.status, &response.text_lossy());
        warn!(status = response.status, error = %error, "YouTube API request failed");
        Err(error)
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> crate::Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| YouTubeError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        access_token: &str,
        what: &str,
    ) -> crate::Result<T> {
        let response = self
            .send_idempotent(self.request(HttpMethod::Get, url, access_token))
            .await?;
        Self::parse(&response, what)
    }

    async fn uploads_playlist_id(&self, access_token: &str, channel_id: &str) -> crate::Result<String> {
        let url = format!(
            "{}/channels?part=contentDetails&id={}",
            self.api_base,
            urlencoding::encode(channel_id)
        );
        let response: ChannelListResponse =
            self.get_json(url, access_token, "channel details").await?;

        response
            .items
            .into_iter()
            .next()
            .and_then(|channel| channel.content_details)
            .and_then(|details| details.related_playlists.uploads)
            .ok_or_else(|| {
                YouTubeError::InvalidResponse(format!(
                    "Channel {} has no uploads playlist",
                    channel_id
                ))
            })
    }

    async fn playlist_video_ids(&self, access_token: &str, playlist_id: &str) -> crate::Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/playlistItems?part=contentDetails&playlistId={}&maxResults={}",
                self.api_base,
                urlencoding::encode(playlist_id),
                MAX_RESULTS
            );
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let page: PlaylistItemListResponse =
                self.get_json(url, access_token, "playlist items").await?;
            ids.extend(page.items.into_iter().map(|item| item.content_details.video_id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(ids)
    }

    fn multipart_body(boundary: &str, metadata_json: &[u8], media: &[u8]) -> Bytes {
        let mut body = BytesMut::with_capacity(media.len() + metadata_json.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata_json);
        body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: video/*\r\n\r\n");
        body.extend_from_slice(media);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body.freeze()
    }
}

#[async_trait]
impl VideoHostingApi for YouTubeConnector {
    #[instrument(skip(self, access_token))]
    async fn list_my_channels(&self, access_token: &str) -> Result<Vec<RemoteChannel>> {
        let url = format!("{}/channels?part=snippet,statistics&mine=true", self.api_base);
        let response: ChannelListResponse = self.get_json(url, access_token, "channel list").await?;

        let channels: Vec<RemoteChannel> = response.items.into_iter().map(Into::into).collect();
        info!(count = channels.len(), "Listed channels");
        Ok(channels)
    }

    #[instrument(skip(self, access_token), fields(channel_id = %channel_id))]
    async fn list_channel_videos(&self, access_token: &str, channel_id: &str) -> Result<Vec<RemoteVideo>> {
        let playlist_id = self.uploads_playlist_id(access_token, channel_id).await?;
        let ids = self.playlist_video_ids(access_token, &playlist_id).await?;
        debug!(count = ids.len(), "Resolved uploads playlist");

        let mut videos = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_RESULTS) {
            let url = format!(
                "{}/videos?part=snippet,statistics,status&id={}",
                self.api_base,
                urlencoding::encode(&chunk.join(","))
            );
            let page: VideoListResponse = self.get_json(url, access_token, "video list").await?;
            videos.extend(page.items.into_iter().map(RemoteVideo::from));
        }

        info!(count = videos.len(), "Listed channel videos");
        Ok(videos)
    }

    #[instrument(skip(self, access_token, metadata, media), fields(bytes = media.len()))]
    async fn insert_video(&self, access_token: &str, metadata: &VideoMetadata, media: Bytes) -> Result<String> {
        let metadata_json = serde_json::to_vec(&VideoUpsert::new(None, metadata))
            .map_err(|e| YouTubeError::ParseError(format!("Failed to encode metadata: {}", e)))?;

        let boundary = format!("studio_{}", Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, &metadata_json, &media);

        let url = format!(
            "{}/videos?uploadType=multipart&part=snippet,status",
            self.upload_base
        );
        let request = self
            .request(HttpMethod::Post, url, access_token)
            .typed_body(format!("multipart/related; boundary={}", boundary), body)
            .timeout(self.upload_timeout);

        let response = self.send(request).await?;
        let created: VideoResource = Self::parse(&response, "inserted video")?;

        if created.id.is_empty() {
            return Err(YouTubeError::InvalidResponse("videos.insert returned no id".to_string()).into());
        }

        info!(remote_id = %created.id, "Video uploaded");
        Ok(created.id)
    }

    #[instrument(skip(self, access_token, metadata), fields(remote_id = %remote_id))]
    async fn update_video(&self, access_token: &str, remote_id: &str, metadata: &VideoMetadata) -> Result<()> {
        let url = format!("{}/videos?part=snippet,status", self.api_base);
        let request = self
            .request(HttpMethod::Put, url, access_token)
            .json(&VideoUpsert::new(Some(remote_id), metadata))?;

        self.send(request).await?;
        info!("Video metadata updated");
        Ok(())
    }

    #[instrument(skip(self, access_token, image), fields(remote_id = %remote_id, bytes = image.len()))]
    async fn set_thumbnail(
        &self,
        access_token: &str,
        remote_id: &str,
        image: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/thumbnails/set?videoId={}",
            self.upload_base,
            urlencoding::encode(remote_id)
        );
        let request = self
            .request(HttpMethod::Post, url, access_token)
            .typed_body(content_type, image);

        self.send(request).await?;
        info!("Thumbnail set");
        Ok(())
    }
}
