//! SQLite-backed [`RecordStore`]
//!
//! Generic table access for the sync engine: rows in and out as JSON maps.
//! Table names come from a fixed list and column names must exist in the
//! table's schema (`pragma_table_info`), since both are interpolated into SQL.

use crate::db::{create_pool, DatabaseConfig};
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::store::{Record, RecordId, RecordStore};
use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

/// Tables the store will touch.
pub const KNOWN_TABLES: &[&str] = &[
    "accounts",
    "channels",
    "videos",
    "languages",
    "categories",
    "visibility",
    "config",
];

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the pool (running migrations) and wrap it.
    pub async fn open(config: DatabaseConfig) -> crate::Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn check_table(table: &str) -> Result<&str> {
        KNOWN_TABLES
            .iter()
            .find(|known| **known == table)
            .copied()
            .ok_or_else(|| {
                BridgeError::OperationFailed(format!("Invalid input: unknown table '{}'", table))
            })
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to read table schema", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("name")
                    .map_err(|e| Self::db_error("Failed to read column name", e))
            })
            .collect()
    }

    fn check_column<'c>(known: &[String], table: &str, column: &'c str) -> Result<&'c str> {
        if known.iter().any(|name| name == column) {
            Ok(column)
        } else {
            Err(BridgeError::OperationFailed(format!(
                "Invalid input: unknown column '{}' in table '{}'",
                column, table
            )))
        }
    }

    fn row_to_record(row: &SqliteRow) -> Record {
        let mut record = Record::new();

        for column in row.columns() {
            let ordinal = column.ordinal();

            let value = if let Ok(v) = row.try_get::<Option<i64>, _>(ordinal) {
                v.map(Value::from).unwrap_or(Value::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(ordinal) {
                v.and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            } else if let Ok(v) = row.try_get::<Option<String>, _>(ordinal) {
                v.map(Value::String).unwrap_or(Value::Null)
            } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(ordinal) {
                v.map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
                    .unwrap_or(Value::Null)
            } else {
                Value::Null
            };

            record.insert(column.name().to_string(), value);
        }

        record
    }

    fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
        match value {
            Value::Null => query.bind(None::<i64>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.clone()),
            other => query.bind(other.to_string()),
        }
    }

    fn db_error(context: &str, err: sqlx::Error) -> BridgeError {
        warn!(error = %err, "{}", context);
        BridgeError::DatabaseError(format!("{}: {}", context, err))
    }

    /// Deletes the account with its channels and their videos in one transaction.
    async fn remove_account_cascade(&self, id: RecordId) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::db_error("Failed to begin transaction", e))?;

        let videos = sqlx::query(
            "DELETE FROM videos WHERE channel_id IN (SELECT id FROM channels WHERE account_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::db_error("Failed to delete account videos", e))?;

        let channels = sqlx::query("DELETE FROM channels WHERE account_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::db_error("Failed to delete account channels", e))?;

        let accounts = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::db_error("Failed to delete account", e))?;

        tx.commit()
            .await
            .map_err(|e| Self::db_error("Failed to commit account removal", e))?;

        info!(
            account_id = id,
            channels = channels.rows_affected(),
            videos = videos.rows_affected(),
            "Removed account"
        );

        Ok(accounts.rows_affected())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, table: &str, id: RecordId) -> Result<Option<Record>> {
        let table = Self::check_table(table)?;
        let sql = format!("SELECT * FROM \"{}\" WHERE id = ?", table);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to fetch record", e))?;

        Ok(row.as_ref().map(Self::row_to_record))
    }

    async fn get_all(&self, table: &str) -> Result<Vec<Record>> {
        let table = Self::check_table(table)?;
        let sql = format!("SELECT * FROM \"{}\" ORDER BY id", table);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to fetch records", e))?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    async fn insert(&self, table: &str, record: Record) -> Result<RecordId> {
        let table = Self::check_table(table)?;
        let known = self.table_columns(table).await?;

        let columns = record
            .keys()
            .map(|key| Self::check_column(&known, table, key))
            .collect::<Result<Vec<_>>>()?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO \"{}\" DEFAULT VALUES", table)
        } else {
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders
            )
        };

        let mut query = sqlx::query(&sql);
        for value in record.values() {
            query = Self::bind_value(query, value);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to insert record", e))?;

        let id = result.last_insert_rowid();
        debug!(table, id, "Inserted record");
        Ok(id)
    }

    async fn update(&self, table: &str, id: RecordId, patch: Record) -> Result<u64> {
        let table = Self::check_table(table)?;

        if patch.is_empty() {
            return Ok(0);
        }

        let known = self.table_columns(table).await?;
        let assignments = patch
            .keys()
            .map(|key| {
                Self::check_column(&known, table, key).map(|column| format!("{} = ?", column))
            })
            .collect::<Result<Vec<_>>>()?;

        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE id = ?",
            table,
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for value in patch.values() {
            query = Self::bind_value(query, value);
        }

        let result = query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to update record", e))?;

        Ok(result.rows_affected())
    }

    async fn remove(&self, table: &str, id: RecordId) -> Result<u64> {
        let table = Self::check_table(table)?;

        if table == "accounts" {
            return self.remove_account_cascade(id).await;
        }

        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", table);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to delete record", e))?;

        Ok(result.rows_affected())
    }

    async fn find_by(&self, table: &str, field: &str, value: &Value) -> Result<Vec<Record>> {
        let table = Self::check_table(table)?;
        let known = self.table_columns(table).await?;
        let field = Self::check_column(&known, table, field)?;

        // Column affinity makes `'12' = 12` compare equal, matching `loosely_equal`.
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE {} = ? ORDER BY id",
            table, field
        );

        let rows = Self::bind_value(sqlx::query(&sql), value)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::db_error("Failed to query records", e))?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn store() -> SqliteRecordStore {
        SqliteRecordStore::new(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_get_record() {
        let store = store().await;

        let id = store
            .insert(
                "accounts",
                record(json!({"name": "Main", "email": "main@example.com"})),
            )
            .await
            .unwrap();

        let row = store.get("accounts", id).await.unwrap().unwrap();
        assert_eq!(row["name"], "Main");
        assert_eq!(row["id"], id);
        assert_eq!(row["access_token"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_returns_rows_affected() {
        let store = store().await;
        let id = store
            .insert("languages", record(json!({"name": "Czech", "code": "cs"})))
            .await
            .unwrap();

        let changed = store
            .update("languages", id, record(json!({"name": "Čeština"})))
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let missing = store
            .update("languages", 9999, record(json!({"name": "x"})))
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn test_find_by_uses_loose_comparison() {
        let store = store().await;
        store
            .insert("videos", record(json!({"title": "Hike", "local_id": "12"})))
            .await
            .unwrap();

        let by_number = store.find_by("videos", "local_id", &json!(12)).await.unwrap();
        let by_text = store.find_by("videos", "local_id", &json!("12")).await.unwrap();

        assert_eq!(by_number.len(), 1);
        assert_eq!(by_text.len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_lookup_tables() {
        let store = store().await;

        let english = store.find_by("languages", "code", &json!("en")).await.unwrap();
        assert_eq!(english[0]["id"], 17);

        let visibility = store.get_all("visibility").await.unwrap();
        assert_eq!(visibility.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_account_cascades() {
        let store = store().await;
        let account = store
            .insert("accounts", record(json!({"name": "Main", "email": "m@x.io"})))
            .await
            .unwrap();
        let channel = store
            .insert(
                "channels",
                record(json!({"name": "EN", "account_id": account, "language": "en"})),
            )
            .await
            .unwrap();
        store
            .insert("videos", record(json!({"title": "A", "channel_id": channel})))
            .await
            .unwrap();

        let removed = store.remove("accounts", account).await.unwrap();

        assert_eq!(removed, 1);
        assert!(store.get_all("channels").await.unwrap().is_empty());
        assert!(store.get_all("videos").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_table_and_bad_columns() {
        let store = store().await;

        assert!(store.get_all("sqlite_master").await.is_err());
        assert!(store
            .insert("videos", record(json!({"title; DROP TABLE videos": "x"})))
            .await
            .is_err());
        assert!(store
            .find_by("videos", "local_id OR 1=1", &json!(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rejects_columns_missing_from_schema() {
        let store = store().await;
        let id = store
            .insert("videos", record(json!({"title": "Hike"})))
            .await
            .unwrap();

        let err = store
            .update("videos", id, record(json!({"youtube_id": "yt-1"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown column 'youtube_id'"));

        assert!(store
            .insert("channels", record(json!({"name": "EN", "views_total": 3})))
            .await
            .is_err());
        assert!(store.find_by("videos", "remote_id", &json!("x")).await.is_err());
        assert!(store.find_by("videos", "youtube_video_id", &json!("x")).await.is_ok());
    }
}
