//! Account repository

use crate::error::{LibraryError, Result};
use crate::models::Account;
use crate::repositories::{from_record, from_records, to_record};
use bridge_traits::store::RecordStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const TABLE: &str = "accounts";

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub google_id: Option<String>,
}

#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn RecordStore>,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        match self.store.get(TABLE, id).await? {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing row is an error.
    pub async fn get(&self, id: i64) -> Result<Account> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("account", id))
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        from_records(self.store.get_all(TABLE).await?)
    }

    pub async fn find_by_google_id(&self, google_id: &str) -> Result<Option<Account>> {
        let rows = self.store.find_by(TABLE, "google_id", &json!(google_id)).await?;
        rows.into_iter().next().map(from_record).transpose()
    }

    pub async fn insert(&self, account: &NewAccount) -> Result<i64> {
        if account.name.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "account name cannot be empty".to_string(),
            });
        }

        Ok(self.store.insert(TABLE, to_record(account)?).await?)
    }

    /// Persist a fresh credential set. Expiry is stored as an RFC 3339 string.
    pub async fn update_tokens(
        &self,
        id: i64,
        access_token: &str,
        refresh_token: Option<&str>,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        let mut patch = bridge_traits::store::Record::new();
        patch.insert("access_token".to_string(), json!(access_token));
        patch.insert("refresh_token".to_string(), json!(refresh_token));
        patch.insert(
            "token_expiry".to_string(),
            json!(expiry.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let changed = self.store.update(TABLE, id, patch).await?;
        if changed == 0 {
            return Err(LibraryError::not_found("account", id));
        }
        Ok(())
    }

    /// Removes the account with its channels and their videos.
    pub async fn remove(&self, id: i64) -> Result<bool> {
        Ok(self.store.remove(TABLE, id).await? > 0)
    }
}
