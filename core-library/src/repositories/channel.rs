//! Channel repository

use crate::error::{LibraryError, Result};
use crate::models::Channel;
use crate::repositories::{from_record, from_records, to_record};
use bridge_traits::store::RecordStore;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const TABLE: &str = "channels";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChannel {
    pub name: String,
    pub account_id: i64,
    pub subscribers: Option<i64>,
    pub views: Option<i64>,
    pub language: String,
    pub youtube_channel_id: Option<String>,
}

/// Fields refreshed on an existing channel. The language is user-owned once
/// the channel exists, so it is not part of the refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStats {
    pub name: String,
    pub account_id: i64,
    pub subscribers: Option<i64>,
    pub views: Option<i64>,
    pub youtube_channel_id: Option<String>,
}

#[derive(Clone)]
pub struct ChannelRepository {
    store: Arc<dyn RecordStore>,
}

impl ChannelRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Channel>> {
        self.store
            .get(TABLE, id)
            .await?
            .map(from_record)
            .transpose()
    }

    pub async fn get(&self, id: i64) -> Result<Channel> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("channel", id))
    }

    pub async fn list(&self) -> Result<Vec<Channel>> {
        from_records(self.store.get_all(TABLE).await?)
    }

    pub async fn list_by_account(&self, account_id: i64) -> Result<Vec<Channel>> {
        from_records(
            self.store
                .find_by(TABLE, "account_id", &json!(account_id))
                .await?,
        )
    }

    pub async fn find_by_remote_id(&self, youtube_channel_id: &str) -> Result<Option<Channel>> {
        let rows = self
            .store
            .find_by(TABLE, "youtube_channel_id", &json!(youtube_channel_id))
            .await?;
        rows.into_iter().next().map(from_record).transpose()
    }

    /// Case-insensitive name match; the first channel wins on duplicates.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Channel>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|channel| channel.name.trim().to_lowercase() == wanted))
    }

    pub async fn insert(&self, channel: &NewChannel) -> Result<i64> {
        Ok(self.store.insert(TABLE, to_record(channel)?).await?)
    }

    pub async fn update_stats(&self, id: i64, stats: &ChannelStats) -> Result<()> {
        let changed = self.store.update(TABLE, id, to_record(stats)?).await?;
        if changed == 0 {
            return Err(LibraryError::not_found("channel", id));
        }
        Ok(())
    }
}
