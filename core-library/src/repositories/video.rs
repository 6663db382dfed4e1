//! Video repository

use crate::error::{LibraryError, Result};
use crate::mapping::VideoFields;
use crate::models::{Video, Visibility};
use crate::repositories::{from_record, from_records, to_record};
use bridge_traits::store::{Record, RecordStore};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const TABLE: &str = "videos";

/// Defaults for a user-created video.
pub const DEFAULT_TITLE: &str = "New Video";
pub const DEFAULT_CATEGORY_ID: i64 = 20;

/// A video row created outside reconciliation (manual add, media assignment).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVideo {
    pub title: String,
    pub channel_id: i64,
    pub visibility_id: i64,
    pub kids: bool,
    pub category_id: i64,
    pub default_language: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl NewVideo {
    pub fn for_channel(channel_id: i64, default_language: Option<i64>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            channel_id,
            visibility_id: Visibility::Private.id(),
            kids: false,
            category_id: DEFAULT_CATEGORY_ID,
            default_language,
            local_id: None,
            local_path: None,
        }
    }
}

#[derive(Clone)]
pub struct VideoRepository {
    store: Arc<dyn RecordStore>,
}

impl VideoRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Video>> {
        self.store
            .get(TABLE, id)
            .await?
            .map(from_record)
            .transpose()
    }

    pub async fn get(&self, id: i64) -> Result<Video> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("video", id))
    }

    pub async fn list(&self) -> Result<Vec<Video>> {
        from_records(self.store.get_all(TABLE).await?)
    }

    pub async fn list_by_channel(&self, channel_id: i64) -> Result<Vec<Video>> {
        from_records(
            self.store
                .find_by(TABLE, "channel_id", &json!(channel_id))
                .await?,
        )
    }

    pub async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Video>> {
        let rows = self
            .store
            .find_by(TABLE, "youtube_video_id", &json!(remote_id))
            .await?;
        rows.into_iter().next().map(from_record).transpose()
    }

    /// Every channel variant sharing `local_id`.
    pub async fn find_by_local_id(&self, local_id: &str) -> Result<Vec<Video>> {
        from_records(
            self.store
                .find_by(TABLE, "local_id", &json!(local_id))
                .await?,
        )
    }

    pub async fn find_variant(&self, local_id: &str, channel_id: i64) -> Result<Option<Video>> {
        Ok(self
            .find_by_local_id(local_id)
            .await?
            .into_iter()
            .find(|video| video.channel_id == Some(channel_id)))
    }

    pub async fn insert(&self, video: &NewVideo) -> Result<i64> {
        Ok(self.store.insert(TABLE, to_record(video)?).await?)
    }

    pub async fn insert_fields(&self, fields: VideoFields) -> Result<i64> {
        Ok(self.store.insert(TABLE, fields.into_record()).await?)
    }

    pub async fn update_fields(&self, id: i64, fields: VideoFields) -> Result<()> {
        self.apply(id, fields.into_record()).await
    }

    /// Adds a default video to a channel; its `local_id` becomes its own row id.
    pub async fn create_default(&self, channel_id: i64, default_language: Option<i64>) -> Result<i64> {
        let id = self
            .insert(&NewVideo::for_channel(channel_id, default_language))
            .await?;
        self.set_field(id, "local_id", json!(id.to_string())).await?;

        debug!(video_id = id, channel_id, "Created default video");
        Ok(id)
    }

    pub async fn set_remote_id(&self, id: i64, remote_id: &str) -> Result<()> {
        self.set_field(id, "youtube_video_id", json!(remote_id)).await
    }

    pub async fn set_local_id(&self, id: i64, local_id: &str) -> Result<()> {
        self.set_field(id, "local_id", json!(local_id)).await
    }

    pub async fn set_local_path(&self, id: i64, local_path: &str) -> Result<()> {
        self.set_field(id, "local_path", json!(local_path)).await
    }

    pub async fn set_thumbnail_path(&self, id: i64, thumbnail_path: &str) -> Result<()> {
        self.set_field(id, "thumbnail_path", json!(thumbnail_path))
            .await
    }

    /// Reassign media to a channel (media auto-assignment of an existing video).
    pub async fn assign_media(
        &self,
        id: i64,
        channel_id: i64,
        default_language: Option<i64>,
        local_path: &str,
    ) -> Result<()> {
        let mut patch = Record::new();
        patch.insert("channel_id".to_string(), json!(channel_id));
        patch.insert("default_language".to_string(), json!(default_language));
        patch.insert("local_path".to_string(), json!(local_path));
        self.apply(id, patch).await
    }

    pub async fn remove(&self, id: i64) -> Result<bool> {
        Ok(self.store.remove(TABLE, id).await? > 0)
    }

    async fn set_field(&self, id: i64, field: &str, value: Value) -> Result<()> {
        let mut patch = Record::new();
        patch.insert(field.to_string(), value);
        self.apply(id, patch).await
    }

    async fn apply(&self, id: i64, patch: Record) -> Result<()> {
        let changed = self.store.update(TABLE, id, patch).await?;
        if changed == 0 {
            return Err(LibraryError::not_found("video", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{seed_channels, test_store};

    #[tokio::test]
    async fn test_create_default_video() {
        let store = test_store().await;
        let channels = seed_channels(&store, 1).await;
        let repo = VideoRepository::new(store);

        let id = repo.create_default(channels[0], Some(17)).await.unwrap();
        let video = repo.get(id).await.unwrap();

        assert_eq!(video.title.as_deref(), Some(DEFAULT_TITLE));
        assert_eq!(video.visibility(), Some(Visibility::Private));
        assert_eq!(video.kids, Some(false));
        assert_eq!(video.category_id, Some(20));
        assert_eq!(video.default_language, Some(17));
        assert_eq!(video.local_id, Some(id.to_string()));
        assert!(video.is_upload_candidate());
    }

    #[tokio::test]
    async fn test_set_remote_id_and_lookup() {
        let store = test_store().await;
        let channels = seed_channels(&store, 1).await;
        let repo = VideoRepository::new(store);
        let id = repo.create_default(channels[0], None).await.unwrap();

        repo.set_remote_id(id, "yt-42").await.unwrap();

        let video = repo.find_by_remote_id("yt-42").await.unwrap().unwrap();
        assert_eq!(video.id, id);
        assert!(!video.is_upload_candidate());
    }

    #[tokio::test]
    async fn test_find_variant_by_local_id_and_channel() {
        let store = test_store().await;
        let channels = seed_channels(&store, 3).await;
        let repo = VideoRepository::new(store);
        let first = repo.create_default(channels[0], None).await.unwrap();
        let second = repo.create_default(channels[1], None).await.unwrap();
        repo.set_local_id(second, &first.to_string()).await.unwrap();

        let variant = repo
            .find_variant(&first.to_string(), channels[1])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(variant.id, second);
        assert_eq!(repo.find_by_local_id(&first.to_string()).await.unwrap().len(), 2);
        assert!(repo
            .find_variant(&first.to_string(), channels[2])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_missing_video_is_not_found() {
        let repo = VideoRepository::new(test_store().await);

        let result = repo.set_local_path(999, "/media/x.mp4").await;
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
    }
}
