//! Media auto-assignment.
//!
//! Scans the media folder for `<localId>-<channelName>.mp4` files and points
//! the matching video row at each one, creating the row when the channel has
//! no variant of that video yet. A sibling `<localId>-<channelName>.jpg` (or
//! `.png`) becomes the thumbnail.

use crate::error::{Result, SyncError};
use bridge_traits::storage::FileSystemAccess;
use core_library::repositories::NewVideo;
use core_library::{ChannelRepository, LanguageRepository, SettingsRepository, VideoRepository};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const MEDIA_EXTENSION: &str = "mp4";
const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "png"];

/// A media file name split into its local id and channel name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFileName {
    pub local_id: String,
    pub channel_name: String,
    /// File name without the extension.
    pub stem: String,
}

/// Parses `<localId>-<channelName>.mp4`, splitting on the last hyphen.
pub fn parse_media_file_name(file_name: &str) -> Option<MediaFileName> {
    let stem = file_name.strip_suffix(".mp4")?;
    let (local_id, channel_name) = stem.rsplit_once('-')?;
    let (local_id, channel_name) = (local_id.trim(), channel_name.trim());
    if local_id.is_empty() || channel_name.is_empty() {
        return None;
    }
    Some(MediaFileName {
        local_id: local_id.to_string(),
        channel_name: channel_name.to_string(),
        stem: stem.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReport {
    pub created: Vec<i64>,
    pub updated: Vec<i64>,
    /// Media files naming a channel that does not exist.
    pub unmatched: Vec<String>,
}

pub struct MediaAssigner {
    file_system: Arc<dyn FileSystemAccess>,
    videos: VideoRepository,
    channels: ChannelRepository,
    languages: LanguageRepository,
    settings: SettingsRepository,
    media_root: Option<PathBuf>,
}

impl MediaAssigner {
    pub fn new(
        file_system: Arc<dyn FileSystemAccess>,
        videos: VideoRepository,
        channels: ChannelRepository,
        languages: LanguageRepository,
        settings: SettingsRepository,
    ) -> Self {
        Self {
            file_system,
            videos,
            channels,
            languages,
            settings,
            media_root: None,
        }
    }

    /// Folder to scan instead of the stored global video path.
    pub fn with_media_root(mut self, media_root: Option<PathBuf>) -> Self {
        self.media_root = media_root;
        self
    }

    async fn resolve_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.media_root {
            return Ok(root.clone());
        }
        self.settings
            .global_video_path()
            .await?
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| SyncError::Config("Global video path not set".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn assign(&self) -> Result<AssignmentReport> {
        let root = self.resolve_root().await?;
        let entries = self.file_system.list_directory(&root).await?;
        let file_names: Vec<String> = entries
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();

        let mut report = AssignmentReport::default();
        for file_name in &file_names {
            let Some(parsed) = parse_media_file_name(file_name) else {
                continue;
            };

            let Some(channel) = self.channels.find_by_name(&parsed.channel_name).await? else {
                warn!(channel = %parsed.channel_name, "No channel for media file");
                report.unmatched.push(file_name.clone());
                continue;
            };
            let language_id = self
                .languages
                .find_by_code(&channel.language)
                .await?
                .map(|l| l.id);
            let media_path = path_string(&root.join(file_name));

            let video_id = match self.videos.find_variant(&parsed.local_id, channel.id).await? {
                Some(existing) => {
                    self.videos
                        .assign_media(existing.id, channel.id, language_id, &media_path)
                        .await?;
                    report.updated.push(existing.id);
                    existing.id
                }
                None => {
                    let mut new = NewVideo::for_channel(channel.id, language_id);
                    new.title = parsed.stem.clone();
                    new.local_id = Some(parsed.local_id.clone());
                    new.local_path = Some(media_path);
                    let id = self.videos.insert(&new).await?;
                    report.created.push(id);
                    id
                }
            };

            if let Some(thumbnail) = find_thumbnail(&parsed, &file_names) {
                let thumbnail_path = path_string(&root.join(thumbnail));
                debug!(video_id, thumbnail = %thumbnail_path, "Attaching thumbnail");
                self.videos
                    .set_thumbnail_path(video_id, &thumbnail_path)
                    .await?;
            }
        }

        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unmatched = report.unmatched.len(),
            "Media assignment finished"
        );
        Ok(report)
    }
}

fn find_thumbnail<'a>(parsed: &MediaFileName, file_names: &'a [String]) -> Option<&'a str> {
    THUMBNAIL_EXTENSIONS.iter().find_map(|ext| {
        let wanted = format!("{}-{}.{}", parsed.local_id, parsed.channel_name, ext);
        file_names
            .iter()
            .find(|name| **name == wanted)
            .map(String::as_str)
    })
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_parse_splits_on_last_hyphen() {
        let parsed = parse_media_file_name("12-a-EN.mp4").unwrap();
        assert_eq!(parsed.local_id, "12-a");
        assert_eq!(parsed.channel_name, "EN");
        assert_eq!(parsed.stem, "12-a-EN");

        let trimmed = parse_media_file_name("7 - Spanish .mp4").unwrap();
        assert_eq!(trimmed.local_id, "7");
        assert_eq!(trimmed.channel_name, "Spanish");

        assert!(parse_media_file_name("nohyphen.mp4").is_none());
        assert!(parse_media_file_name("12-EN.mov").is_none());
        assert!(parse_media_file_name("-EN.mp4").is_none());
    }

    fn assigner(
        store: &Arc<dyn bridge_traits::store::RecordStore>,
        fs: MemoryFileSystem,
    ) -> MediaAssigner {
        MediaAssigner::new(
            Arc::new(fs),
            VideoRepository::new(store.clone()),
            ChannelRepository::new(store.clone()),
            LanguageRepository::new(store.clone()),
            SettingsRepository::new(store.clone()),
        )
    }

    #[tokio::test]
    async fn test_assigns_new_and_existing_videos() {
        let store = test_store().await;
        let account = seed_account(&store).await;
        let en = seed_channel(&store, account, "English", "en").await;
        let es = seed_channel(&store, account, "Spanish", "es").await;
        let videos = VideoRepository::new(store.clone());
        let mut existing = NewVideo::for_channel(es, None);
        existing.local_id = Some("12".to_string());
        let existing_id = videos.insert(&existing).await.unwrap();

        let fs = MemoryFileSystem::default()
            .with_file("/media/12-english.mp4", b"a")
            .with_file("/media/12-english.png", b"p")
            .with_file("/media/12-Spanish.mp4", b"b")
            .with_file("/media/12-German.mp4", b"c")
            .with_file("/media/notes.txt", b"n");

        let report = assigner(&store, fs)
            .with_media_root(Some(PathBuf::from("/media")))
            .assign()
            .await
            .unwrap();

        assert_eq!(report.updated, vec![existing_id]);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.unmatched, vec!["12-German.mp4".to_string()]);

        let created = videos.get(report.created[0]).await.unwrap();
        assert_eq!(created.channel_id, Some(en));
        assert_eq!(created.title.as_deref(), Some("12-english"));
        assert_eq!(created.local_id.as_deref(), Some("12"));
        assert_eq!(created.default_language, Some(17));
        assert_eq!(created.local_path.as_deref(), Some("/media/12-english.mp4"));
        assert_eq!(created.thumbnail_path.as_deref(), Some("/media/12-english.png"));

        let updated = videos.get(existing_id).await.unwrap();
        assert_eq!(updated.local_path.as_deref(), Some("/media/12-Spanish.mp4"));
        assert_eq!(updated.default_language, Some(19));
        assert_eq!(updated.thumbnail_path, None);
    }

    #[tokio::test]
    async fn test_missing_media_folder_is_a_config_error() {
        let store = test_store().await;

        let err = assigner(&store, MemoryFileSystem::default())
            .assign()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Config(_)));
    }
}
