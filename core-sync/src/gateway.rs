//! # Remote Video Gateway
//!
//! Turns a local `Video` row into provider metadata and performs the create,
//! update and thumbnail calls against a [`VideoHostingApi`]. Each operation is
//! one remote round-trip, plus a thumbnail call when requested.

use crate::error::{Result, SyncError};
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::video::{VideoHostingApi, VideoMetadata};
use core_auth::AccessCredential;
use core_library::models::Video;
use core_library::repositories::video::DEFAULT_CATEGORY_ID;
use core_library::LanguageRepository;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// YouTube rejects longer titles.
pub const MAX_TITLE_CHARS: usize = 100;

/// Language code sent when the video has no resolvable language.
pub const FALLBACK_LANGUAGE_CODE: &str = "en";

pub struct RemoteVideoGateway {
    api: Arc<dyn VideoHostingApi>,
    file_system: Arc<dyn FileSystemAccess>,
    languages: LanguageRepository,
}

impl RemoteVideoGateway {
    pub fn new(
        api: Arc<dyn VideoHostingApi>,
        file_system: Arc<dyn FileSystemAccess>,
        languages: LanguageRepository,
    ) -> Self {
        Self {
            api,
            file_system,
            languages,
        }
    }

    /// Provider metadata for `video`.
    pub async fn build_metadata(&self, video: &Video) -> Result<VideoMetadata> {
        let language_code = self.language_code(video.default_language).await;

        Ok(VideoMetadata {
            title: truncate_title(video.display_title()),
            description: video.description.clone().unwrap_or_default(),
            tags: video.tag_list(),
            category_id: video.category_id.unwrap_or(DEFAULT_CATEGORY_ID).to_string(),
            default_language: language_code.clone(),
            default_audio_language: language_code,
            privacy_status: video.privacy_status().to_string(),
            made_for_kids: video.made_for_kids(),
        })
    }

    /// Uploads the media file with its metadata and returns the new remote id.
    ///
    /// A thumbnail failure after a successful upload is logged and does not
    /// fail the create, so the caller can still record the remote id.
    #[instrument(skip(self, video, credential), fields(video_id = video.id))]
    pub async fn create(
        &self,
        video: &Video,
        credential: &AccessCredential,
        upload_thumbnail: bool,
    ) -> Result<String> {
        let local_path = video
            .local_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                SyncError::InvalidInput(format!("video {} has no media file assigned", video.id))
            })?;

        let metadata = self.build_metadata(video).await?;
        let media = self
            .file_system
            .read_file(Path::new(local_path))
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read {}: {}", local_path, e)))?;

        debug!(bytes = media.len(), "Uploading media");
        let remote_id = self
            .api
            .insert_video(credential.token(), &metadata, media)
            .await?;
        info!(remote_id = %remote_id, "Video created");

        if upload_thumbnail {
            if let Some(thumbnail) = video.thumbnail_path.as_deref().filter(|p| !p.is_empty()) {
                if let Err(e) = self
                    .set_thumbnail(&remote_id, Path::new(thumbnail), credential)
                    .await
                {
                    warn!(remote_id = %remote_id, error = %e, "Thumbnail upload failed after create");
                }
            }
        }

        Ok(remote_id)
    }

    /// Replaces the remote metadata of an already uploaded video.
    #[instrument(skip(self, video, credential), fields(video_id = video.id))]
    pub async fn update(
        &self,
        video: &Video,
        credential: &AccessCredential,
        upload_thumbnail: bool,
    ) -> Result<()> {
        let remote_id = video
            .remote_id()
            .ok_or_else(|| SyncError::not_found("remote video", video.id))?;

        let metadata = self.build_metadata(video).await?;
        self.api
            .update_video(credential.token(), remote_id, &metadata)
            .await?;
        info!(remote_id = %remote_id, "Video updated");

        if upload_thumbnail {
            if let Some(thumbnail) = video.thumbnail_path.as_deref().filter(|p| !p.is_empty()) {
                self.set_thumbnail(remote_id, Path::new(thumbnail), credential)
                    .await?;
            }
        }

        Ok(())
    }

    #[instrument(skip(self, credential), fields(remote_id = %remote_id))]
    pub async fn set_thumbnail(
        &self,
        remote_id: &str,
        image_path: &Path,
        credential: &AccessCredential,
    ) -> Result<()> {
        let image = self
            .file_system
            .read_file(image_path)
            .await
            .map_err(|e| {
                SyncError::Storage(format!("failed to read {}: {}", image_path.display(), e))
            })?;

        self.api
            .set_thumbnail(
                credential.token(),
                remote_id,
                image,
                thumbnail_content_type(image_path),
            )
            .await?;
        Ok(())
    }

    async fn language_code(&self, language_id: Option<i64>) -> String {
        let Some(id) = language_id else {
            return FALLBACK_LANGUAGE_CODE.to_string();
        };

        match self.languages.find_by_id(id).await {
            Ok(Some(language)) if !language.code.is_empty() => language.code,
            Ok(_) => FALLBACK_LANGUAGE_CODE.to_string(),
            Err(e) => {
                warn!(language_id = id, error = %e, "Language lookup failed");
                FALLBACK_LANGUAGE_CODE.to_string()
            }
        }
    }
}

/// First 100 characters of `title`.
pub fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

fn thumbnail_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}
