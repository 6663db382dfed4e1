#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, RemoteErrorKind, Result as BridgeResult};
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bridge_traits::store::RecordStore;
use bridge_traits::video::{RemoteChannel, RemoteVideo, VideoHostingApi, VideoMetadata};
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use core_auth::{TokenGrant, TokenGuard, TokenRefresher};
use core_library::db::create_test_pool;
use core_library::repositories::{NewAccount, NewChannel};
use core_library::{AccountRepository, ChannelRepository, LanguageRepository, SqliteRecordStore};
use core_library::VideoRepository;
use core_runtime::events::EventBus;
use core_sync::{
    BulkSyncOrchestrator, RemoteVideoGateway, ReconciliationMatcher, UploadQueue,
    VideoUploadExecutor,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ordered log shared by the fakes, so tests can assert call ordering across
/// collaborators.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub enum Reply {
    Id(String),
    Quota,
}

/// Video host that records every call and answers from a script keyed by
/// video title (inserts) or remote id (updates).
#[derive(Default)]
pub struct ScriptedApi {
    pub log: CallLog,
    replies: Mutex<HashMap<String, Reply>>,
    channels: Mutex<Vec<RemoteChannel>>,
    videos: Mutex<HashMap<String, Vec<RemoteVideo>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    counter: AtomicUsize,
    extra_latency_ms: AtomicU64,
}

impl ScriptedApi {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub async fn reply(&self, key: &str, reply: Reply) {
        self.replies.lock().await.insert(key.to_string(), reply);
    }

    pub async fn set_listing(&self, channels: Vec<RemoteChannel>, videos: Vec<(&str, Vec<RemoteVideo>)>) {
        *self.channels.lock().await = channels;
        let mut map = self.videos.lock().await;
        for (channel_id, list) in videos {
            map.insert(channel_id.to_string(), list);
        }
    }

    pub async fn log(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }

    /// Slows every insert and update down by `ms` on top of the base 5ms.
    pub fn set_latency(&self, ms: u64) {
        self.extra_latency_ms.store(ms, Ordering::SeqCst);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn mutate(&self, entry: String, key: &str, default: String) -> BridgeResult<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let latency = 5 + self.extra_latency_ms.load(Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(latency)).await;
        self.log.lock().await.push(entry);
        let reply = self.replies.lock().await.remove(key);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(Reply::Quota) => Err(BridgeError::Remote {
                kind: RemoteErrorKind::QuotaExceeded,
                status: Some(403),
                message: "The request cannot be completed because you have exceeded your quota."
                    .to_string(),
            }),
            Some(Reply::Id(id)) => Ok(id),
            None => Ok(default),
        }
    }
}

#[async_trait]
impl VideoHostingApi for ScriptedApi {
    async fn list_my_channels(&self, _access_token: &str) -> BridgeResult<Vec<RemoteChannel>> {
        self.log.lock().await.push("channels.list".to_string());
        Ok(self.channels.lock().await.clone())
    }

    async fn list_channel_videos(
        &self,
        _access_token: &str,
        channel_id: &str,
    ) -> BridgeResult<Vec<RemoteVideo>> {
        self.log.lock().await.push(format!("videos.list {}", channel_id));
        Ok(self
            .videos
            .lock()
            .await
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_video(
        &self,
        access_token: &str,
        metadata: &VideoMetadata,
        _media: Bytes,
    ) -> BridgeResult<String> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.mutate(
            format!("insert {} [{}]", metadata.title, access_token),
            &metadata.title,
            format!("remote-{}", n),
        )
        .await
    }

    async fn update_video(
        &self,
        access_token: &str,
        remote_id: &str,
        _metadata: &VideoMetadata,
    ) -> BridgeResult<()> {
        self.mutate(
            format!("update {} [{}]", remote_id, access_token),
            remote_id,
            remote_id.to_string(),
        )
        .await
        .map(|_| ())
    }

    async fn set_thumbnail(
        &self,
        _access_token: &str,
        remote_id: &str,
        _image: Bytes,
        _content_type: &str,
    ) -> BridgeResult<()> {
        self.log.lock().await.push(format!("thumbnail {}", remote_id));
        Ok(())
    }
}

/// Every path reads as a small file.
pub struct AnyFile;

#[async_trait]
impl FileSystemAccess for AnyFile {
    async fn exists(&self, _path: &Path) -> BridgeResult<bool> {
        Ok(true)
    }

    async fn metadata(&self, _path: &Path) -> BridgeResult<FileMetadata> {
        Ok(FileMetadata {
            size: 4,
            modified_at: None,
            is_directory: false,
        })
    }

    async fn read_file(&self, _path: &Path) -> BridgeResult<Bytes> {
        Ok(Bytes::from_static(b"data"))
    }

    async fn list_directory(&self, _path: &Path) -> BridgeResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

pub struct LoggingRefresher {
    pub log: CallLog,
}

#[async_trait]
impl TokenRefresher for LoggingRefresher {
    async fn refresh(&self, _refresh_token: &str) -> core_auth::Result<TokenGrant> {
        self.log.lock().await.push("token refresh".to_string());
        Ok(TokenGrant {
            access_token: "ya29.refreshed".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: Some("Bearer".to_string()),
            scope: None,
        })
    }
}

/// Fully wired sync stack over an in-memory database.
pub struct Harness {
    pub store: Arc<dyn RecordStore>,
    pub bus: EventBus,
    pub api: Arc<ScriptedApi>,
    pub queue: UploadQueue,
    pub orchestrator: BulkSyncOrchestrator,
    pub matcher: ReconciliationMatcher,
    pub videos: VideoRepository,
    pub channels: ChannelRepository,
    pub accounts: AccountRepository,
}

impl Harness {
    pub async fn new() -> Self {
        let store: Arc<dyn RecordStore> =
            Arc::new(SqliteRecordStore::new(create_test_pool().await.unwrap()));
        let bus = EventBus::new(256);
        let log: CallLog = Arc::default();
        let api = Arc::new(ScriptedApi::with_log(log.clone()));

        let accounts = AccountRepository::new(store.clone());
        let channels = ChannelRepository::new(store.clone());
        let videos = VideoRepository::new(store.clone());
        let languages = LanguageRepository::new(store.clone());

        let token_guard = Arc::new(TokenGuard::new(
            accounts.clone(),
            Arc::new(LoggingRefresher { log }),
            bus.clone(),
        ));
        let gateway = Arc::new(RemoteVideoGateway::new(
            api.clone(),
            Arc::new(AnyFile),
            languages.clone(),
        ));
        let executor = Arc::new(VideoUploadExecutor::new(
            videos.clone(),
            channels.clone(),
            token_guard.clone(),
            gateway,
        ));
        let queue = UploadQueue::new(executor, bus.clone());
        let orchestrator = BulkSyncOrchestrator::new(queue.clone(), videos.clone(), bus.clone());
        let matcher = ReconciliationMatcher::new(
            api.clone(),
            token_guard,
            accounts.clone(),
            channels.clone(),
            videos.clone(),
            languages,
            bus.clone(),
        );

        Self {
            store,
            bus,
            api,
            queue,
            orchestrator,
            matcher,
            videos,
            channels,
            accounts,
        }
    }

    pub async fn account(&self, expires_at: DateTime<Utc>) -> i64 {
        let id = self
            .accounts
            .insert(&NewAccount {
                name: "Main".to_string(),
                email: "main@example.com".to_string(),
                google_id: Some("g-1".to_string()),
            })
            .await
            .unwrap();
        self.accounts
            .update_tokens(id, "ya29.stored", Some("1//refresh"), expires_at)
            .await
            .unwrap();
        id
    }

    pub async fn signed_in_account(&self) -> i64 {
        self.account(Utc::now() + Duration::hours(1)).await
    }

    pub async fn channel(&self, account_id: i64, name: &str) -> i64 {
        self.channels
            .insert(&NewChannel {
                name: name.to_string(),
                account_id,
                subscribers: Some(0),
                views: Some(0),
                language: "en".to_string(),
                youtube_channel_id: None,
            })
            .await
            .unwrap()
    }
}
