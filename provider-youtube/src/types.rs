//! YouTube Data API v3 resource types
//!
//! Only the parts the connector reads or writes are modelled. Counts arrive as
//! decimal strings.

use bridge_traits::video::{RemoteChannel, RemoteVideo, VideoMetadata};
use serde::{Deserialize, Serialize};

/// `channels.list` response
#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    pub default_language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    pub subscriber_count: Option<String>,
    pub view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

/// `playlistItems.list` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
}

/// `videos.list` response
#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

/// Video resource as returned by `videos.list` and `videos.insert`
#[derive(Debug, Deserialize)]
pub struct VideoResource {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub statistics: Option<VideoStatistics>,
    pub status: Option<VideoStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub default_language: Option<String>,
    pub default_audio_language: Option<String>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: Option<String>,
    pub made_for_kids: Option<bool>,
    pub self_declared_made_for_kids: Option<bool>,
}

/// Request body for `videos.insert` and `videos.update` with `part=snippet,status`
#[derive(Debug, Serialize)]
pub struct VideoUpsert<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub snippet: UpsertSnippet<'a>,
    pub status: UpsertStatus<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSnippet<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub tags: &'a [String],
    pub category_id: &'a str,
    pub default_language: &'a str,
    pub default_audio_language: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertStatus<'a> {
    pub privacy_status: &'a str,
    pub self_declared_made_for_kids: bool,
}

impl<'a> VideoUpsert<'a> {
    pub fn new(id: Option<&'a str>, metadata: &'a VideoMetadata) -> Self {
        Self {
            id,
            snippet: UpsertSnippet {
                title: &metadata.title,
                description: &metadata.description,
                tags: &metadata.tags,
                category_id: &metadata.category_id,
                default_language: &metadata.default_language,
                default_audio_language: &metadata.default_audio_language,
            },
            status: UpsertStatus {
                privacy_status: &metadata.privacy_status,
                self_declared_made_for_kids: metadata.made_for_kids,
            },
        }
    }
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<GoogleErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorItem {
    #[serde(default)]
    pub reason: String,
    pub domain: Option<String>,
    pub message: Option<String>,
}

fn parse_count(value: Option<&String>) -> Option<u64> {
    value.and_then(|v| v.parse().ok())
}

impl From<ChannelResource> for RemoteChannel {
    fn from(resource: ChannelResource) -> Self {
        let (title, default_language) = match resource.snippet {
            Some(snippet) => (snippet.title, snippet.default_language),
            None => (String::new(), None),
        };
        let statistics = resource.statistics.as_ref();

        RemoteChannel {
            id: resource.id,
            title,
            default_language,
            subscriber_count: parse_count(statistics.and_then(|s| s.subscriber_count.as_ref())),
            view_count: parse_count(statistics.and_then(|s| s.view_count.as_ref())),
        }
    }
}

impl From<VideoResource> for RemoteVideo {
    fn from(resource: VideoResource) -> Self {
        let view_count = parse_count(
            resource
                .statistics
                .as_ref()
                .and_then(|s| s.view_count.as_ref()),
        );
        let (privacy_status, made_for_kids) = match resource.status {
            Some(status) => (
                status.privacy_status,
                status.made_for_kids.or(status.self_declared_made_for_kids),
            ),
            None => (None, None),
        };

        let mut video = RemoteVideo {
            id: resource.id,
            privacy_status,
            made_for_kids,
            view_count,
            ..Default::default()
        };

        if let Some(snippet) = resource.snippet {
            video.title = snippet.title;
            video.description = snippet.description;
            video.published_at = snippet.published_at;
            video.tags = snippet.tags;
            video.category_id = snippet.category_id;
            video.default_language = snippet.default_language;
            video.default_audio_language = snippet.default_audio_language;
            video.thumbnail_url = snippet
                .thumbnails
                .and_then(|t| t.default)
                .map(|thumbnail| thumbnail.url);
        }

        video
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_resource_conversion() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "snippet": {
                "publishedAt": "2024-02-10T08:00:00Z",
                "title": "12 Alps Hike",
                "description": "Day one",
                "tags": ["alps", "hike"],
                "categoryId": "19",
                "defaultAudioLanguage": "es",
                "thumbnails": {"default": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg"}}
            },
            "statistics": {"viewCount": "1532"},
            "status": {"privacyStatus": "unlisted", "madeForKids": false}
        }"#;

        let resource: VideoResource = serde_json::from_str(json).unwrap();
        let video = RemoteVideo::from(resource);

        assert_eq!(video.title, "12 Alps Hike");
        assert_eq!(video.view_count, Some(1532));
        assert_eq!(video.category_id.as_deref(), Some("19"));
        assert_eq!(video.default_language, None);
        assert_eq!(video.default_audio_language.as_deref(), Some("es"));
        assert_eq!(video.privacy_status.as_deref(), Some("unlisted"));
        assert_eq!(video.made_for_kids, Some(false));
        assert!(video.thumbnail_url.unwrap().ends_with("default.jpg"));
    }

    #[test]
    fn test_channel_without_statistics() {
        let json = r#"{"id": "UC1", "snippet": {"title": "Hikes EN", "defaultLanguage": "en"}}"#;
        let channel = RemoteChannel::from(serde_json::from_str::<ChannelResource>(json).unwrap());

        assert_eq!(channel.title, "Hikes EN");
        assert_eq!(channel.default_language.as_deref(), Some("en"));
        assert_eq!(channel.subscriber_count, None);
    }

    #[test]
    fn test_upsert_body_shape() {
        let metadata = VideoMetadata {
            title: "Hike".to_string(),
            description: String::new(),
            tags: vec!["a".to_string()],
            category_id: "22".to_string(),
            default_language: "en".to_string(),
            default_audio_language: "en".to_string(),
            privacy_status: "private".to_string(),
            made_for_kids: true,
        };

        let value = serde_json::to_value(VideoUpsert::new(Some("yt-1"), &metadata)).unwrap();

        assert_eq!(value["id"], "yt-1");
        assert_eq!(value["snippet"]["categoryId"], "22");
        assert_eq!(value["snippet"]["defaultAudioLanguage"], "en");
        assert_eq!(value["status"]["selfDeclaredMadeForKids"], true);

        let insert = serde_json::to_value(VideoUpsert::new(None, &metadata)).unwrap();
        assert!(insert.get("id").is_none());
    }
}
