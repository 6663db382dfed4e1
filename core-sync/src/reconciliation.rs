//! # Reconciliation
//!
//! Pull-direction sync: maps the remote channel and video listings of an
//! account onto local rows.
//!
//! - Channels are matched by remote channel id. A new channel takes the
//!   remote language; an existing one keeps its local language and only has
//!   its name, counters and owner refreshed.
//! - Videos are matched by remote video id. A match is fully overwritten with
//!   the remote fields; local media and thumbnail paths are never touched.
//!   A new video gets a `local_id` taken from the first token of its title.
//!
//! Running a pass twice against the same listing inserts nothing the second
//! time and leaves every field as the first pass wrote it.
//!
//! [`ReconciliationMatcher::reconcile_stored_channel`] re-lists the uploads of
//! a single stored channel without touching the channel row.

use crate::error::{Result, SyncError};
use bridge_traits::video::{RemoteChannel, RemoteVideo, VideoHostingApi};
use core_auth::{AccessCredential, TokenGuard};
use core_library::mapping::{local_id_from_title, remote_language_code};
use core_library::models::Channel;
use core_library::repositories::{ChannelStats, NewChannel};
use core_library::{
    map_video_fields, AccountRepository, ChannelRepository, LanguageRepository, MappingContext,
    VideoRepository, VideoSource,
};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Channel language stored when the remote declares none.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub channels_inserted: u32,
    pub channels_updated: u32,
    pub videos_inserted: u32,
    pub videos_updated: u32,
}

impl ReconciliationReport {
    fn absorb(&mut self, other: ReconciliationReport) {
        self.channels_inserted += other.channels_inserted;
        self.channels_updated += other.channels_updated;
        self.videos_inserted += other.videos_inserted;
        self.videos_updated += other.videos_updated;
    }
}

/// Result of reconciling one account during a full pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountReconciliation {
    Completed {
        account_id: i64,
        report: ReconciliationReport,
    },
    Failed {
        account_id: i64,
        message: String,
    },
}

pub struct ReconciliationMatcher {
    api: Arc<dyn VideoHostingApi>,
    token_guard: Arc<TokenGuard>,
    accounts: AccountRepository,
    channels: ChannelRepository,
    videos: VideoRepository,
    languages: LanguageRepository,
    event_bus: EventBus,
}

impl ReconciliationMatcher {
    pub fn new(
        api: Arc<dyn VideoHostingApi>,
        token_guard: Arc<TokenGuard>,
        accounts: AccountRepository,
        channels: ChannelRepository,
        videos: VideoRepository,
        languages: LanguageRepository,
        event_bus: EventBus,
    ) -> Self {
        Self {
            api,
            token_guard,
            accounts,
            channels,
            videos,
            languages,
            event_bus,
        }
    }

    /// Reconciles every channel of one account.
    ///
    /// # Errors
    ///
    /// `NotFound` for `"channel"` when the account lists no channels, plus any
    /// auth, remote or storage failure. Rows written before the failure stay.
    #[instrument(skip(self))]
    pub async fn reconcile_account(&self, account_id: i64) -> Result<ReconciliationReport> {
        self.reported(account_id, self.reconcile_account_inner(account_id))
            .await
    }

    /// Reconciles the uploads of one stored channel, using its owner's token.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown channel; `InvalidInput` when the channel has
    /// no owning account or was never linked to a remote channel.
    #[instrument(skip(self))]
    pub async fn reconcile_stored_channel(&self, channel_id: i64) -> Result<ReconciliationReport> {
        let channel = self.channels.get(channel_id).await?;
        let account_id = channel.account_id.ok_or_else(|| {
            SyncError::InvalidInput(format!("Channel {} has no account", channel_id))
        })?;

        self.reported(account_id, self.reconcile_stored_channel_inner(&channel, account_id))
            .await
    }

    /// Wraps a pass in started/completed/failed events for `account_id`.
    async fn reported(
        &self,
        account_id: i64,
        pass: impl std::future::Future<Output = Result<ReconciliationReport>>,
    ) -> Result<ReconciliationReport> {
        self.emit(SyncEvent::ReconciliationStarted { account_id });

        match pass.await {
            Ok(report) => {
                info!(?report, "Reconciled");
                self.emit(SyncEvent::ReconciliationCompleted {
                    account_id,
                    channels_inserted: report.channels_inserted,
                    channels_updated: report.channels_updated,
                    videos_inserted: report.videos_inserted,
                    videos_updated: report.videos_updated,
                });
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "Reconciliation failed");
                self.emit(SyncEvent::ReconciliationFailed {
                    account_id,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Reconciles each stored account in turn. One account failing does not
    /// stop the others.
    pub async fn reconcile_all_accounts(&self) -> Result<Vec<AccountReconciliation>> {
        let accounts = self.accounts.list().await?;
        let mut outcomes = Vec::with_capacity(accounts.len());

        for account in accounts {
            let outcome = match self.reconcile_account(account.id).await {
                Ok(report) => AccountReconciliation::Completed {
                    account_id: account.id,
                    report,
                },
                Err(e) => AccountReconciliation::Failed {
                    account_id: account.id,
                    message: e.to_string(),
                },
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn reconcile_account_inner(&self, account_id: i64) -> Result<ReconciliationReport> {
        let credential = self.token_guard.ensure_valid(account_id).await?;
        let remote_channels = self.api.list_my_channels(credential.token()).await?;
        if remote_channels.is_empty() {
            return Err(SyncError::not_found("channel", account_id));
        }

        let mut report = ReconciliationReport::default();
        for remote in &remote_channels {
            report.absorb(self.reconcile_channel(account_id, remote, &credential).await?);
        }
        Ok(report)
    }

    /// Matches one remote channel and all of its uploads.
    #[instrument(skip(self, remote, credential), fields(remote_channel = %remote.id))]
    pub async fn reconcile_channel(
        &self,
        account_id: i64,
        remote: &RemoteChannel,
        credential: &AccessCredential,
    ) -> Result<ReconciliationReport> {
        let mut report = ReconciliationReport::default();
        let channel = match self.channels.find_by_remote_id(&remote.id).await? {
            Some(existing) => {
                self.channels
                    .update_stats(
                        existing.id,
                        &ChannelStats {
                            name: remote.title.clone(),
                            account_id,
                            subscribers: remote.subscriber_count.map(|c| c as i64),
                            views: remote.view_count.map(|c| c as i64),
                            youtube_channel_id: Some(remote.id.clone()),
                        },
                    )
                    .await?;
                report.channels_updated += 1;
                existing
            }
            None => {
                let id = self
                    .channels
                    .insert(&NewChannel {
                        name: remote.title.clone(),
                        account_id,
                        subscribers: remote.subscriber_count.map(|c| c as i64),
                        views: remote.view_count.map(|c| c as i64),
                        language: remote
                            .default_language
                            .clone()
                            .filter(|l| !l.trim().is_empty())
                            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
                        youtube_channel_id: Some(remote.id.clone()),
                    })
                    .await?;
                report.channels_inserted += 1;
                debug!(channel_id = id, "Inserted channel");
                self.channels.get(id).await?
            }
        };

        report.absorb(self.reconcile_uploads(&channel, &remote.id, credential).await?);
        Ok(report)
    }

    async fn reconcile_stored_channel_inner(
        &self,
        channel: &Channel,
        account_id: i64,
    ) -> Result<ReconciliationReport> {
        let remote_channel_id = channel
            .youtube_channel_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                SyncError::InvalidInput(format!(
                    "Channel {} is not linked to a remote channel",
                    channel.id
                ))
            })?;

        let credential = self.token_guard.ensure_valid(account_id).await?;
        self.reconcile_uploads(channel, remote_channel_id, &credential)
            .await
    }

    async fn reconcile_uploads(
        &self,
        channel: &Channel,
        remote_channel_id: &str,
        credential: &AccessCredential,
    ) -> Result<ReconciliationReport> {
        let mut report = ReconciliationReport::default();
        let remote_videos = self
            .api
            .list_channel_videos(credential.token(), remote_channel_id)
            .await?;
        for video in &remote_videos {
            if self.reconcile_video(channel, video).await? {
                report.videos_inserted += 1;
            } else {
                report.videos_updated += 1;
            }
        }

        Ok(report)
    }

    /// Returns `true` when a new row was inserted.
    async fn reconcile_video(&self, channel: &Channel, remote: &RemoteVideo) -> Result<bool> {
        let code = remote_language_code(remote, &channel.language);
        let language_id = self.languages.find_by_code(code).await?.map(|l| l.id);
        let ctx = MappingContext {
            channel_id: channel.id,
            language_id,
        };
        let mut fields = map_video_fields(VideoSource::Remote(remote), &ctx);

        match self.videos.find_by_remote_id(&remote.id).await? {
            Some(existing) => {
                self.videos.update_fields(existing.id, fields).await?;
                Ok(false)
            }
            None => {
                let local_id = local_id_from_title(&remote.title);
                fields.local_id = Some(local_id.clone());
                let id = self.videos.insert_fields(fields).await?;
                self.videos.set_local_id(id, &local_id).await?;
                debug!(video_id = id, remote_id = %remote.id, "Inserted video");
                Ok(true)
            }
        }
    }

    fn emit(&self, event: SyncEvent) {
        self.event_bus.emit(CoreEvent::Sync(event)).ok();
    }
}
