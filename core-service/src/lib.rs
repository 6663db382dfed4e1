//! Core service façade and bootstrap helpers.
//!
//! [`CoreService`] is built once at process start. It owns the single upload
//! queue (and so the process-wide quota latch) and wires the token guard, the
//! YouTube connector, the gateway, the batch orchestrator, reconciliation,
//! apply-to-all and media assignment over one local database.
//!
//! [`CoreService::bootstrap`] also installs the global `tracing` subscriber
//! when `CoreConfig::logging` is set.
//!
//! Desktop hosts enable the `desktop-shims` feature so the HTTP client and
//! file system are defaulted from `bridge-desktop`; other hosts inject them
//! through [`CoreConfig`] or build the service from [`CoreDependencies`].

pub mod error;

pub use error::{Result, ServiceError};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::storage::FileSystemAccess;
use bridge_traits::store::RecordStore;
use bridge_traits::video::VideoHostingApi;
use core_auth::{AccessCredential, GoogleTokenRefresher, RefreshOutcome, TokenGuard, TokenRefresher};
use core_library::db::DatabaseConfig;
use core_library::{
    AccountRepository, ChannelRepository, LanguageRepository, SettingsRepository,
    SqliteRecordStore, VideoRepository,
};
use core_runtime::config::DEFAULT_TOKEN_REFRESH_MARGIN;
use core_runtime::events::{CoreEvent, EventBus, Receiver, DEFAULT_EVENT_BUFFER_SIZE};
use core_runtime::logging::init_logging;
use core_runtime::CoreConfig;
use core_sync::{
    AccountReconciliation, ApplyToAll, AssignmentReport, BatchSummary, BulkSyncOrchestrator,
    MediaAssigner, PropagationReport, QueueSnapshot, ReconciliationMatcher, ReconciliationReport,
    RemoteVideoGateway, UploadHandle, UploadQueue, VideoTranslator, VideoUploadExecutor,
};
use provider_youtube::YouTubeConnector;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Collaborators the service is assembled from.
pub struct CoreDependencies {
    pub store: Arc<dyn RecordStore>,
    pub video_api: Arc<dyn VideoHostingApi>,
    pub token_refresher: Arc<dyn TokenRefresher>,
    pub file_system: Arc<dyn FileSystemAccess>,
}

#[derive(Clone)]
pub struct ServiceOptions {
    pub event_buffer_size: usize,
    pub token_refresh_margin: Duration,
    /// Overrides the stored global video path for media assignment.
    pub media_library_path: Option<PathBuf>,
    pub translator: Option<Arc<dyn VideoTranslator>>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            token_refresh_margin: DEFAULT_TOKEN_REFRESH_MARGIN,
            media_library_path: None,
            translator: None,
        }
    }
}

impl std::fmt::Debug for ServiceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOptions")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("token_refresh_margin", &self.token_refresh_margin)
            .field("media_library_path", &self.media_library_path)
            .field("translator", &self.translator.is_some())
            .finish()
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    event_bus: EventBus,
    accounts: AccountRepository,
    channels: ChannelRepository,
    videos: VideoRepository,
    languages: LanguageRepository,
    token_guard: Arc<TokenGuard>,
    queue: UploadQueue,
    orchestrator: BulkSyncOrchestrator,
    matcher: ReconciliationMatcher,
    propagation: ApplyToAll,
    media: MediaAssigner,
}

impl CoreService {
    /// Opens the database named in `config` and wires the Google token
    /// endpoint and the YouTube connector over the configured HTTP client.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        if let Some(logging) = config.logging {
            // Filters were validated above; this only fails when a subscriber is already set.
            if let Err(e) = init_logging(logging) {
                warn!(error = %e, "Keeping the existing tracing subscriber");
            }
        }

        let store = SqliteRecordStore::open(DatabaseConfig::new(&config.database_path)).await?;
        let token_refresher = GoogleTokenRefresher::new(config.oauth, config.http_client.clone());
        let video_api = YouTubeConnector::new(config.http_client)
            .with_upload_timeout(config.upload_timeout);

        let deps = CoreDependencies {
            store: Arc::new(store),
            video_api: Arc::new(video_api),
            token_refresher: Arc::new(token_refresher),
            file_system: config.file_system,
        };
        let options = ServiceOptions {
            event_buffer_size: config.event_buffer_size,
            token_refresh_margin: config.token_refresh_margin,
            media_library_path: config.media_library_path,
            translator: None,
        };

        Ok(Self::new(deps, options))
    }

    /// Uploads must be queued from within a Tokio runtime, since the queue
    /// spawns its drain task on first enqueue.
    pub fn new(deps: CoreDependencies, options: ServiceOptions) -> Self {
        let store = deps.store;
        let event_bus = EventBus::new(options.event_buffer_size);

        let accounts = AccountRepository::new(store.clone());
        let channels = ChannelRepository::new(store.clone());
        let videos = VideoRepository::new(store.clone());
        let languages = LanguageRepository::new(store.clone());
        let settings = SettingsRepository::new(store);

        let token_guard = Arc::new(
            TokenGuard::new(accounts.clone(), deps.token_refresher, event_bus.clone())
                .with_margin(options.token_refresh_margin),
        );
        let gateway = Arc::new(RemoteVideoGateway::new(
            deps.video_api.clone(),
            deps.file_system.clone(),
            languages.clone(),
        ));
        let executor = Arc::new(VideoUploadExecutor::new(
            videos.clone(),
            channels.clone(),
            token_guard.clone(),
            gateway,
        ));
        let queue = UploadQueue::new(executor, event_bus.clone());
        let orchestrator =
            BulkSyncOrchestrator::new(queue.clone(), videos.clone(), event_bus.clone());
        let matcher = ReconciliationMatcher::new(
            deps.video_api,
            token_guard.clone(),
            accounts.clone(),
            channels.clone(),
            videos.clone(),
            languages.clone(),
            event_bus.clone(),
        );

        let mut propagation = ApplyToAll::new(videos.clone(), channels.clone(), languages.clone());
        if let Some(translator) = options.translator {
            propagation = propagation.with_translator(translator);
        }
        let media = MediaAssigner::new(
            deps.file_system,
            videos.clone(),
            channels.clone(),
            languages.clone(),
            settings,
        )
        .with_media_root(options.media_library_path);

        info!("Core service ready");
        Self {
            inner: Arc::new(ServiceInner {
                event_bus,
                accounts,
                channels,
                videos,
                languages,
                token_guard,
                queue,
                orchestrator,
                matcher,
                propagation,
                media,
            }),
        }
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.inner.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn accounts(&self) -> &AccountRepository {
        &self.inner.accounts
    }

    pub fn channels(&self) -> &ChannelRepository {
        &self.inner.channels
    }

    pub fn videos(&self) -> &VideoRepository {
        &self.inner.videos
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    pub async fn ensure_valid_token(&self, account_id: i64) -> Result<AccessCredential> {
        Ok(self.inner.token_guard.ensure_valid(account_id).await?)
    }

    /// Startup login check over every stored account.
    pub async fn refresh_all_accounts(&self) -> Result<Vec<(i64, RefreshOutcome)>> {
        Ok(self.inner.token_guard.refresh_all().await?)
    }

    // ------------------------------------------------------------------
    // Upload queue and batches
    // ------------------------------------------------------------------

    pub async fn run_batch(&self, video_ids: &[i64], upload_thumbnail: bool) -> BatchSummary {
        self.inner.orchestrator.run(video_ids, upload_thumbnail).await
    }

    pub async fn run_batch_with_cancellation(
        &self,
        video_ids: &[i64],
        upload_thumbnail: bool,
        cancel: &CancellationToken,
    ) -> BatchSummary {
        self.inner
            .orchestrator
            .run_with_cancellation(video_ids, upload_thumbnail, cancel)
            .await
    }

    /// Queues a single create or update outside of a batch.
    pub fn enqueue_upload(&self, video_id: i64, upload_thumbnail: bool) -> Result<UploadHandle> {
        Ok(self.inner.queue.enqueue(video_id, upload_thumbnail)?)
    }

    pub fn pause_upload(&self, video_id: i64) -> bool {
        self.inner.queue.pause(video_id)
    }

    pub fn resume_upload(&self, video_id: i64) -> bool {
        self.inner.queue.resume(video_id)
    }

    pub fn cancel_upload(&self, video_id: i64) -> bool {
        self.inner.queue.cancel(video_id)
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.inner.queue.snapshot()
    }

    pub fn clear_quota_latch(&self) {
        self.inner.queue.clear_quota_latch();
    }

    // ------------------------------------------------------------------
    // Library maintenance
    // ------------------------------------------------------------------

    pub async fn reconcile_account(&self, account_id: i64) -> Result<ReconciliationReport> {
        Ok(self.inner.matcher.reconcile_account(account_id).await?)
    }

    /// Re-lists the uploads of one stored channel.
    pub async fn reconcile_channel(&self, channel_id: i64) -> Result<ReconciliationReport> {
        Ok(self.inner.matcher.reconcile_stored_channel(channel_id).await?)
    }

    pub async fn reconcile_all_accounts(&self) -> Result<Vec<AccountReconciliation>> {
        Ok(self.inner.matcher.reconcile_all_accounts().await?)
    }

    pub async fn apply_to_all(&self, video_id: i64) -> Result<PropagationReport> {
        Ok(self.inner.propagation.apply(video_id).await?)
    }

    pub async fn auto_assign_media(&self) -> Result<AssignmentReport> {
        Ok(self.inner.media.assign().await?)
    }

    /// Adds a default video to a channel, in the channel's language.
    #[instrument(skip(self))]
    pub async fn add_video(&self, channel_id: i64) -> Result<i64> {
        let channel = self.inner.channels.get(channel_id).await?;
        let language_id = self
            .inner
            .languages
            .find_by_code(&channel.language)
            .await?
            .map(|l| l.id);
        Ok(self
            .inner
            .videos
            .create_default(channel_id, language_id)
            .await?)
    }
}
