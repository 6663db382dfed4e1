//! Keyed Record Store
//!
//! The local storage collaborator. Callers address rows by table name and
//! integer id and exchange loosely typed JSON records, so the core never
//! depends on a particular storage engine or query language.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// A single stored row, keyed by column name.
pub type Record = Map<String, Value>;

/// Row identifier assigned by the store on insert.
pub type RecordId = i64;

/// Generic keyed-record store.
///
/// `update` applies a partial record: only the columns present in `patch`
/// are written. Both `update` and `remove` report the number of rows affected
/// so callers can detect a missing id without a prior read.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::store::{Record, RecordStore};
/// use serde_json::json;
///
/// async fn rename(store: &dyn RecordStore, id: i64) -> Result<()> {
///     let mut patch = Record::new();
///     patch.insert("title".to_string(), json!("Episode 12"));
///     store.update("videos", id, patch).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one row by id
    async fn get(&self, table: &str, id: RecordId) -> Result<Option<Record>>;

    /// Fetch every row of a table, ordered by id
    async fn get_all(&self, table: &str) -> Result<Vec<Record>>;

    /// Insert a row and return its new id
    async fn insert(&self, table: &str, record: Record) -> Result<RecordId>;

    /// Apply a partial update to one row
    async fn update(&self, table: &str, id: RecordId, patch: Record) -> Result<u64>;

    /// Delete one row
    async fn remove(&self, table: &str, id: RecordId) -> Result<u64>;

    /// Find rows whose `field` equals `value`
    ///
    /// The default scans `get_all`; stores with an index should override it.
    async fn find_by(&self, table: &str, field: &str, value: &Value) -> Result<Vec<Record>> {
        let rows = self.get_all(table).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.get(field).map(|v| loosely_equal(v, value)).unwrap_or(false))
            .collect())
    }
}

/// Equality that tolerates the number/string mixing common in loosely typed stores.
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::Number(b)) | (Value::Number(b), Value::String(a)) => {
            a.trim() == b.to_string()
        }
        (Value::Bool(a), Value::Number(b)) | (Value::Number(b), Value::Bool(a)) => {
            b.as_i64() == Some(i64::from(*a))
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct VecStore {
        rows: Mutex<Vec<Record>>,
    }

    #[async_trait]
    impl RecordStore for VecStore {
        async fn get(&self, _table: &str, id: RecordId) -> Result<Option<Record>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|r| r.get("id") == Some(&json!(id)))
                .cloned())
        }

        async fn get_all(&self, _table: &str) -> Result<Vec<Record>> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn insert(&self, _table: &str, mut record: Record) -> Result<RecordId> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            record.insert("id".to_string(), json!(id));
            rows.push(record);
            Ok(id)
        }

        async fn update(&self, _table: &str, _id: RecordId, _patch: Record) -> Result<u64> {
            Ok(0)
        }

        async fn remove(&self, _table: &str, _id: RecordId) -> Result<u64> {
            Ok(0)
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_default_find_by_matches_loose_types() {
        let store = VecStore {
            rows: Mutex::new(Vec::new()),
        };
        store
            .insert("videos", record(json!({"local_id": "42", "title": "a"})))
            .await
            .unwrap();
        store
            .insert("videos", record(json!({"local_id": 43, "title": "b"})))
            .await
            .unwrap();

        let found = store.find_by("videos", "local_id", &json!(42)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&json!("a")));

        let found = store.find_by("videos", "local_id", &json!("43")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&json!("b")));
    }

    #[test]
    fn test_loosely_equal() {
        assert!(loosely_equal(&json!(1), &json!(true)));
        assert!(loosely_equal(&json!("7"), &json!(7)));
        assert!(!loosely_equal(&json!("7a"), &json!(7)));
        assert!(loosely_equal(&json!("abc"), &json!("abc")));
    }
}
