//! Language lookups

use crate::error::Result;
use crate::models::Language;
use crate::repositories::{from_record, from_records};
use bridge_traits::store::RecordStore;
use serde_json::json;
use std::sync::Arc;

const TABLE: &str = "languages";

#[derive(Clone)]
pub struct LanguageRepository {
    store: Arc<dyn RecordStore>,
}

impl LanguageRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Language>> {
        self.store
            .get(TABLE, id)
            .await?
            .map(from_record)
            .transpose()
    }

    /// Exact code match (`en-US` and `en` are different rows).
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Language>> {
        let rows = self.store.find_by(TABLE, "code", &json!(code)).await?;
        rows.into_iter().next().map(from_record).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Language>> {
        from_records(self.store.get_all(TABLE).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::test_store;

    #[tokio::test]
    async fn test_seeded_codes() {
        let repo = LanguageRepository::new(test_store().await);

        let spanish = repo.find_by_code("es-ES").await.unwrap().unwrap();
        assert_eq!(spanish.id, 20);
        assert_eq!(repo.find_by_id(17).await.unwrap().unwrap().code, "en");
        assert!(repo.find_by_code("unknown").await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap().len(), 21);
    }
}
