//! The singleton `config` row

use crate::error::{LibraryError, Result};
use crate::models::StudioSettings;
use crate::repositories::from_record;
use bridge_traits::store::{Record, RecordStore};
use serde_json::json;
use std::sync::Arc;

const TABLE: &str = "config";
const SETTINGS_ID: i64 = 1;

#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn RecordStore>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<StudioSettings> {
        self.store
            .get(TABLE, SETTINGS_ID)
            .await?
            .map(from_record)
            .transpose()?
            .ok_or_else(|| LibraryError::not_found("config", SETTINGS_ID))
    }

    /// Folder scanned by media auto-assignment, if one was saved.
    pub async fn global_video_path(&self) -> Result<Option<String>> {
        Ok(self
            .load()
            .await?
            .global_video_path
            .filter(|path| !path.trim().is_empty()))
    }

    pub async fn set_global_video_path(&self, path: Option<&str>) -> Result<()> {
        let mut patch = Record::new();
        patch.insert("global_video_path".to_string(), json!(path));

        let changed = self.store.update(TABLE, SETTINGS_ID, patch).await?;
        if changed == 0 {
            return Err(LibraryError::not_found("config", SETTINGS_ID));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::test_store;

    #[tokio::test]
    async fn test_global_video_path() {
        let repo = SettingsRepository::new(test_store().await);
        assert_eq!(repo.global_video_path().await.unwrap(), None);

        repo.set_global_video_path(Some("/media/exports"))
            .await
            .unwrap();
        assert_eq!(
            repo.global_video_path().await.unwrap().as_deref(),
            Some("/media/exports")
        );
    }
}
