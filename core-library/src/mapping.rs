//! Field mapping onto `videos` rows
//!
//! Reconciliation (remote listing into local rows) and apply-to-all (one local
//! video onto its sibling channels) both write the same set of shared fields.
//! They go through [`map_video_fields`] so the two paths cannot drift.

use crate::models::{Video, Visibility};
use bridge_traits::store::Record;
use bridge_traits::video::RemoteVideo;
use serde::Serialize;

/// Where the shared fields are copied from.
#[derive(Debug, Clone, Copy)]
pub enum VideoSource<'a> {
    Remote(&'a RemoteVideo),
    Local(&'a Video),
}

/// Target of the mapping: the owning channel and the `languages` row id
/// resolved for it (`None` when the code has no row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingContext {
    pub channel_id: i64,
    pub language_id: Option<i64>,
}

/// Columns only the remote listing knows about. When present, both are
/// written, nulls included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteStats {
    pub views: Option<i64>,
    pub thumbnail_remote: Option<String>,
}

/// Column values for a `videos` insert or update.
///
/// Shared fields are always written, including nulls. The trailing optional
/// fields are only written when set, so an update leaves the stored value alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub publish_date: Option<String>,
    pub category_id: Option<i64>,
    pub default_language: Option<i64>,
    pub visibility_id: Option<i64>,
    pub kids: Option<bool>,
    pub channel_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_text: Option<String>,
}

impl VideoFields {
    pub fn into_record(self) -> Record {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Record::new(),
        }
    }
}

pub fn map_video_fields(source: VideoSource<'_>, ctx: &MappingContext) -> VideoFields {
    match source {
        VideoSource::Remote(remote) => VideoFields {
            title: Some(remote.title.clone()),
            description: remote.description.clone(),
            tags: Some(remote.tags.join(",")),
            publish_date: remote.published_at.clone(),
            category_id: remote
                .category_id
                .as_deref()
                .and_then(|id| id.trim().parse().ok()),
            default_language: ctx.language_id,
            visibility_id: Some(
                remote
                    .privacy_status
                    .as_deref()
                    .and_then(Visibility::from_privacy_status)
                    .unwrap_or(Visibility::Public)
                    .id(),
            ),
            kids: remote.made_for_kids,
            channel_id: ctx.channel_id,
            local_id: None,
            youtube_video_id: Some(remote.id.clone()),
            remote: Some(RemoteStats {
                views: remote.view_count.map(|v| v as i64),
                thumbnail_remote: remote.thumbnail_url.clone(),
            }),
            thumbnail_text: None,
        },
        VideoSource::Local(video) => VideoFields {
            title: video.title.clone(),
            description: video.description.clone(),
            tags: video.tags.clone(),
            publish_date: video.publish_date.clone(),
            category_id: video.category_id,
            default_language: ctx.language_id,
            visibility_id: video.visibility_id,
            kids: video.kids,
            channel_id: ctx.channel_id,
            local_id: video.local_id.clone(),
            youtube_video_id: None,
            remote: None,
            thumbnail_text: video.thumbnail_text.clone(),
        },
    }
}

/// Language code for a listed video: its default language, then its audio
/// language, then the channel's.
pub fn remote_language_code<'a>(remote: &'a RemoteVideo, channel_language: &'a str) -> &'a str {
    [
        remote.default_language.as_deref(),
        remote.default_audio_language.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|code| !code.trim().is_empty())
    .unwrap_or(channel_language)
}

/// Local id assigned to a newly discovered remote video: the title up to the
/// first whitespace, `-` or `_`.
pub fn local_id_from_title(title: &str) -> String {
    title
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .next()
        .unwrap_or_default()
        .to_string()
}
