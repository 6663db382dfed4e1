//! The queue's remote step for one video: credential, then create or update.

use crate::error::{Result, SyncError};
use crate::gateway::RemoteVideoGateway;
use crate::upload_queue::{UploadExecutor, UploadTask};
use async_trait::async_trait;
use core_auth::TokenGuard;
use core_library::{ChannelRepository, VideoRepository};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Runs an [`UploadTask`] against the remote gateway.
///
/// A video without a remote id is created and the new id is written back to
/// its row before the task settles; anything else is updated in place.
pub struct VideoUploadExecutor {
    videos: VideoRepository,
    channels: ChannelRepository,
    token_guard: Arc<TokenGuard>,
    gateway: Arc<RemoteVideoGateway>,
}

impl VideoUploadExecutor {
    pub fn new(
        videos: VideoRepository,
        channels: ChannelRepository,
        token_guard: Arc<TokenGuard>,
        gateway: Arc<RemoteVideoGateway>,
    ) -> Self {
        Self {
            videos,
            channels,
            token_guard,
            gateway,
        }
    }

    async fn account_for(&self, video_id: i64, channel_id: Option<i64>) -> Result<i64> {
        let channel_id = channel_id.ok_or_else(|| {
            SyncError::InvalidInput(format!("video {} is not assigned to a channel", video_id))
        })?;
        let channel = self.channels.get(channel_id).await?;
        channel
            .account_id
            .ok_or_else(|| SyncError::not_found("account for channel", channel.id))
    }
}

#[async_trait]
impl UploadExecutor for VideoUploadExecutor {
    #[instrument(skip(self), fields(video_id = task.video_id))]
    async fn execute(&self, task: &UploadTask) -> Result<String> {
        let video = self.videos.get(task.video_id).await?;
        let account_id = self.account_for(video.id, video.channel_id).await?;
        let credential = self.token_guard.ensure_valid(account_id).await?;

        match video.remote_id() {
            Some(remote_id) => {
                debug!(remote_id, "Updating existing video");
                self.gateway
                    .update(&video, &credential, task.upload_thumbnail)
                    .await?;
                Ok(remote_id.to_string())
            }
            None => {
                let remote_id = self
                    .gateway
                    .create(&video, &credential, task.upload_thumbnail)
                    .await?;
                self.videos.set_remote_id(video.id, &remote_id).await?;
                Ok(remote_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use core_library::repositories::NewVideo;
    use core_library::LanguageRepository;
    use core_runtime::events::EventBus;

    #[tokio::test]
    async fn test_create_persists_remote_id() {
        let store = test_store().await;
        let bus = EventBus::new(16);
        let account = seed_account(&store).await;
        let channel = seed_channel(&store, account, "EN", "en").await;
        let videos = VideoRepository::new(store.clone());
        let mut new = NewVideo::for_channel(channel, None);
        new.local_path = Some("/m/1-EN.mp4".to_string());
        let id = videos.insert(&new).await.unwrap();

        let api = Arc::new(FakeVideoApi::default());
        api.script_insert(Scripted::Ok("abc".to_string())).await;
        let gateway = Arc::new(RemoteVideoGateway::new(
            api.clone(),
            Arc::new(MemoryFileSystem::default().with_file("/m/1-EN.mp4", b"mp4")),
            LanguageRepository::new(store.clone()),
        ));
        let executor = VideoUploadExecutor::new(
            videos.clone(),
            ChannelRepository::new(store.clone()),
            token_guard(&store, &bus),
            gateway,
        );

        let remote_id = executor
            .execute(&UploadTask {
                video_id: id,
                upload_thumbnail: false,
            })
            .await
            .unwrap();

        assert_eq!(remote_id, "abc");
        assert_eq!(videos.get(id).await.unwrap().remote_id(), Some("abc"));
    }

    #[tokio::test]
    async fn test_missing_video_is_not_found() {
        let store = test_store().await;
        let bus = EventBus::new(16);
        let executor = VideoUploadExecutor::new(
            VideoRepository::new(store.clone()),
            ChannelRepository::new(store.clone()),
            token_guard(&store, &bus),
            Arc::new(RemoteVideoGateway::new(
                Arc::new(FakeVideoApi::default()),
                Arc::new(MemoryFileSystem::default()),
                LanguageRepository::new(store.clone()),
            )),
        );

        let err = executor
            .execute(&UploadTask {
                video_id: 404,
                upload_thumbnail: false,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NotFound { .. }));
    }
}
