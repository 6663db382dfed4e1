//! Video Hosting Provider Abstraction
//!
//! Wire-level contract for a remote video-hosting API. Every operation is
//! authenticated per call with a bearer credential and maps to one provider
//! endpoint, except `list_channel_videos`, which walks the channel's uploads
//! playlist and resolves full video resources.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A channel owned by the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteChannel {
    pub id: String,
    pub title: String,
    pub default_language: Option<String>,
    pub subscriber_count: Option<u64>,
    pub view_count: Option<u64>,
}

/// A video resource as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteVideo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// RFC 3339 publish timestamp
    pub published_at: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub default_language: Option<String>,
    pub default_audio_language: Option<String>,
    /// Provider privacy vocabulary: `public`, `private`, `unlisted`
    pub privacy_status: Option<String>,
    pub made_for_kids: Option<bool>,
    pub view_count: Option<u64>,
    pub thumbnail_url: Option<String>,
}

/// Outbound metadata for insert and update, already in provider vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub default_language: String,
    pub default_audio_language: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
}

/// Remote video-hosting API.
///
/// Failures carry a [`RemoteErrorKind`](crate::error::RemoteErrorKind) through
/// [`BridgeError::Remote`](crate::error::BridgeError::Remote); quota exhaustion
/// in particular must be reported as `RemoteErrorKind::QuotaExceeded`.
#[async_trait]
pub trait VideoHostingApi: Send + Sync {
    /// Channels of the authenticated account (`channels.list mine=true`)
    async fn list_my_channels(&self, access_token: &str) -> Result<Vec<RemoteChannel>>;

    /// Every uploaded video of a channel
    async fn list_channel_videos(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<Vec<RemoteVideo>>;

    /// Upload media plus metadata (`videos.insert`); returns the new remote id
    async fn insert_video(
        &self,
        access_token: &str,
        metadata: &VideoMetadata,
        media: Bytes,
    ) -> Result<String>;

    /// Replace snippet and status of an existing video (`videos.update`)
    async fn update_video(
        &self,
        access_token: &str,
        remote_id: &str,
        metadata: &VideoMetadata,
    ) -> Result<()>;

    /// Replace the custom thumbnail (`thumbnails.set`)
    async fn set_thumbnail(
        &self,
        access_token: &str,
        remote_id: &str,
        image: Bytes,
        content_type: &str,
    ) -> Result<()>;
}
