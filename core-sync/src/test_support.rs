//! Fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, RemoteErrorKind, Result as BridgeResult};
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bridge_traits::store::RecordStore;
use bridge_traits::video::{RemoteChannel, RemoteVideo, VideoHostingApi, VideoMetadata};
use bytes::Bytes;
use chrono::{Duration, Utc};
use core_auth::{AccessCredential, TokenGrant, TokenGuard, TokenRefresher};
use core_library::db::create_test_pool;
use core_library::repositories::{NewAccount, NewChannel};
use core_library::{AccountRepository, ChannelRepository, SqliteRecordStore};
use core_runtime::events::EventBus;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn credential() -> AccessCredential {
    AccessCredential {
        account_id: 1,
        access_token: "ya29.test".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Ok(String),
    Quota,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListChannels,
    ListVideos { channel_id: String },
    Insert { title: String, bytes: usize },
    Update { remote_id: String },
    Thumbnail { remote_id: String, content_type: String },
}

#[derive(Default)]
pub struct FakeVideoApi {
    calls: Mutex<Vec<ApiCall>>,
    inserts: Mutex<VecDeque<Scripted>>,
    updates: Mutex<HashMap<String, Scripted>>,
    channels: Mutex<Vec<RemoteChannel>>,
    videos: Mutex<HashMap<String, Vec<RemoteVideo>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    insert_counter: AtomicUsize,
}

impl FakeVideoApi {
    pub async fn script_insert(&self, outcome: Scripted) {
        self.inserts.lock().await.push_back(outcome);
    }

    pub async fn script_update(&self, remote_id: &str, outcome: Scripted) {
        self.updates.lock().await.insert(remote_id.to_string(), outcome);
    }

    pub async fn set_channels(&self, channels: Vec<RemoteChannel>) {
        *self.channels.lock().await = channels;
    }

    pub async fn set_videos(&self, channel_id: &str, videos: Vec<RemoteVideo>) {
        self.videos
            .lock()
            .await
            .insert(channel_id.to_string(), videos);
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn record(&self, call: ApiCall) {
        self.calls.lock().await.push(call);
    }

    /// Holds the call open briefly so overlapping calls would be observed.
    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn settle(outcome: Scripted) -> BridgeResult<String> {
        match outcome {
            Scripted::Ok(id) => Ok(id),
            Scripted::Quota => Err(BridgeError::Remote {
                kind: RemoteErrorKind::QuotaExceeded,
                status: Some(403),
                message: "The request cannot be completed because you have exceeded your quota."
                    .to_string(),
            }),
            Scripted::Fail(message) => Err(BridgeError::Remote {
                kind: RemoteErrorKind::Other,
                status: Some(400),
                message,
            }),
        }
    }
}

#[async_trait]
impl VideoHostingApi for FakeVideoApi {
    async fn list_my_channels(&self, _access_token: &str) -> BridgeResult<Vec<RemoteChannel>> {
        self.record(ApiCall::ListChannels).await;
        Ok(self.channels.lock().await.clone())
    }

    async fn list_channel_videos(
        &self,
        _access_token: &str,
        channel_id: &str,
    ) -> BridgeResult<Vec<RemoteVideo>> {
        self.record(ApiCall::ListVideos {
            channel_id: channel_id.to_string(),
        })
        .await;
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
        _access_token: &str,
        metadata: &VideoMetadata,
        media: Bytes,
    ) -> BridgeResult<String> {
        self.enter().await;
        self.record(ApiCall::Insert {
            title: metadata.title.clone(),
            bytes: media.len(),
        })
        .await;
        let n = self.insert_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self
            .inserts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Scripted::Ok(format!("remote-{}", n)));
        self.leave();
        Self::settle(outcome)
    }

    async fn update_video(
        &self,
        _access_token: &str,
        remote_id: &str,
        _metadata: &VideoMetadata,
    ) -> BridgeResult<()> {
        self.enter().await;
        self.record(ApiCall::Update {
            remote_id: remote_id.to_string(),
        })
        .await;
        let outcome = self
            .updates
            .lock()
            .await
            .remove(remote_id)
            .unwrap_or_else(|| Scripted::Ok(remote_id.to_string()));
        self.leave();
        Self::settle(outcome).map(|_| ())
    }

    async fn set_thumbnail(
        &self,
        _access_token: &str,
        remote_id: &str,
        _image: Bytes,
        content_type: &str,
    ) -> BridgeResult<()> {
        self.record(ApiCall::Thumbnail {
            remote_id: remote_id.to_string(),
            content_type: content_type.to_string(),
        })
        .await;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryFileSystem {
    files: HashMap<PathBuf, Bytes>,
}

impl MemoryFileSystem {
    pub fn with_file(mut self, path: &str, contents: &'static [u8]) -> Self {
        self.files
            .insert(PathBuf::from(path), Bytes::from_static(contents));
        self
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        Ok(self.files.contains_key(path) || self.files.keys().any(|p| p.parent() == Some(path)))
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        let bytes = self
            .files
            .get(path)
            .ok_or_else(|| BridgeError::OperationFailed(format!("missing {}", path.display())))?;
        Ok(FileMetadata {
            size: bytes.len() as u64,
            modified_at: None,
            is_directory: false,
        })
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed(format!("missing {}", path.display())))
    }

    async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        entries.sort();
        Ok(entries)
    }
}

/// Refresher that always grants the same token.
pub struct StaticRefresher;

#[async_trait]
impl TokenRefresher for StaticRefresher {
    async fn refresh(&self, _refresh_token: &str) -> core_auth::Result<TokenGrant> {
        Ok(TokenGrant {
            access_token: "ya29.refreshed".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: Some("Bearer".to_string()),
            scope: None,
        })
    }
}

pub async fn test_store() -> Arc<dyn RecordStore> {
    Arc::new(SqliteRecordStore::new(create_test_pool().await.unwrap()))
}

pub fn token_guard(store: &Arc<dyn RecordStore>, bus: &EventBus) -> Arc<TokenGuard> {
    Arc::new(TokenGuard::new(
        AccountRepository::new(store.clone()),
        Arc::new(StaticRefresher),
        bus.clone(),
    ))
}

/// One signed-in account with a token valid for an hour.
pub async fn seed_account(store: &Arc<dyn RecordStore>) -> i64 {
    let accounts = AccountRepository::new(store.clone());
    let id = accounts
        .insert(&NewAccount {
            name: "Main".to_string(),
            email: "main@example.com".to_string(),
            google_id: Some("g-1".to_string()),
        })
        .await
        .unwrap();
    accounts
        .update_tokens(id, "ya29.stored", Some("1//refresh"), Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    id
}

pub async fn seed_channel(
    store: &Arc<dyn RecordStore>,
    account_id: i64,
    name: &str,
    language: &str,
) -> i64 {
    ChannelRepository::new(store.clone())
        .insert(&NewChannel {
            name: name.to_string(),
            account_id,
            subscribers: Some(0),
            views: Some(0),
            language: language.to_string(),
            youtube_channel_id: None,
        })
        .await
        .unwrap()
}
