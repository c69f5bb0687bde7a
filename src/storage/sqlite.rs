// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite storage backend for the local follow cache.
//!
//! Schema:
//! ```sql
//! CREATE TABLE follows (
//!   id   TEXT PRIMARY KEY,
//!   name TEXT NOT NULL,
//!   bio  TEXT NOT NULL,
//!   url  TEXT NOT NULL,
//!   time INTEGER NOT NULL      -- indexed, drives paged retrieval
//! );
//! CREATE TABLE sync_meta (
//!   key   TEXT PRIMARY KEY,    -- 'last_follow_modify' holds the Clock Marker
//!   value INTEGER NOT NULL
//! );
//! ```
//!
//! The marker lives in its own table so ordinary mutations write it
//! separately, while [`LocalStore::replace_all`] covers both tables in a
//! single transaction.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::FollowSyncConfig;
use crate::record::FollowRecord;
use crate::resilience::retry::{retry, RetryConfig};
use super::traits::{LocalStore, SortOrder, StorageError};

const MARKER_KEY: &str = "last_follow_modify";

pub struct SqliteStore {
    pool: SqlitePool,
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    ///
    /// Connection uses startup-mode retry so a bad path fails fast.
    pub async fn new(url: &str) -> Result<Self, StorageError> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .journal_mode(if in_memory { SqliteJournalMode::Memory } else { SqliteJournalMode::Wal });

        let pool = retry("sqlite_connect", &RetryConfig::startup(), || {
            // Every pooled connection to ":memory:" is its own database, so pin to one
            let builder = if in_memory {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                SqlitePoolOptions::new()
                    .max_connections(4)
                    .acquire_timeout(Duration::from_secs(10))
            };
            let options = options.clone();
            async move { builder.connect_with(options).await.map_err(backend) }
        })
        .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!(url = %url, "SQLite follow store ready");
        Ok(store)
    }

    /// Open the store named by `config.sqlite_url`, or an in-memory one.
    pub async fn connect_with_config(config: &FollowSyncConfig) -> Result<Self, StorageError> {
        let url = config.sqlite_url.as_deref().unwrap_or("sqlite::memory:");
        Self::new(url).await
    }

    /// Get a clone of the connection pool.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS follows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                bio TEXT NOT NULL,
                url TEXT NOT NULL,
                time INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_follows_time ON follows (time)",
            "CREATE TABLE IF NOT EXISTS sync_meta (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            )",
        ];
        for sql in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> Result<FollowRecord, StorageError> {
        Ok(FollowRecord {
            id: row.try_get("id").map_err(backend)?,
            name: row.try_get("name").map_err(backend)?,
            bio: row.try_get("bio").map_err(backend)?,
            url: row.try_get("url").map_err(backend)?,
            time: row.try_get("time").map_err(backend)?,
        })
    }

    fn rows_to_records(rows: &[SqliteRow]) -> Result<Vec<FollowRecord>, StorageError> {
        rows.iter().map(Self::row_to_record).collect()
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<FollowRecord>, StorageError> {
        let row = sqlx::query("SELECT id, name, bio, url, time FROM follows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn add(&self, record: &FollowRecord) -> Result<(), StorageError> {
        let result = sqlx::query("INSERT INTO follows (id, name, bio, url, time) VALUES (?, ?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.bio)
            .bind(&record.url)
            .bind(record.time)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::Duplicate(record.id.clone()))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn update(&self, id: &str, record: &FollowRecord) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "UPDATE follows SET id = ?, name = ?, bio = ?, url = ?, time = ? WHERE id = ?",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.bio)
        .bind(&record.url)
        .bind(record.time)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::Duplicate(record.id.clone()))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM follows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM follows")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        let count: i64 = row.try_get("cnt").map_err(backend)?;
        Ok(count as u64)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM follows")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<FollowRecord>, StorageError> {
        let rows = sqlx::query("SELECT id, name, bio, url, time FROM follows")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Self::rows_to_records(&rows)
    }

    async fn page_by_time(
        &self,
        order: SortOrder,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<FollowRecord>, StorageError> {
        let sql = match order {
            SortOrder::Ascending => {
                "SELECT id, name, bio, url, time FROM follows ORDER BY time ASC, id ASC LIMIT ? OFFSET ?"
            }
            SortOrder::Descending => {
                "SELECT id, name, bio, url, time FROM follows ORDER BY time DESC, id DESC LIMIT ? OFFSET ?"
            }
        };
        let rows = sqlx::query(sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Self::rows_to_records(&rows)
    }

    async fn replace_all(&self, records: &[FollowRecord], marker: i64) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query("DELETE FROM follows")
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        for record in records {
            // Later duplicates in the incoming list win, same as a bulk put
            sqlx::query("INSERT OR REPLACE INTO follows (id, name, bio, url, time) VALUES (?, ?, ?, ?, ?)")
                .bind(&record.id)
                .bind(&record.name)
                .bind(&record.bio)
                .bind(&record.url)
                .bind(record.time)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        sqlx::query(
            "INSERT INTO sync_meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(MARKER_KEY)
        .bind(marker)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        debug!(records = records.len(), marker, "Follow table replaced");
        Ok(())
    }

    async fn clock_marker(&self) -> Result<Option<i64>, StorageError> {
        let row = sqlx::query("SELECT value FROM sync_meta WHERE key = ?")
            .bind(MARKER_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(|r| r.try_get::<i64, _>("value").map_err(backend))
            .transpose()
    }

    async fn set_clock_marker(&self, marker: i64) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO sync_meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(MARKER_KEY)
        .bind(marker)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, time: i64) -> FollowRecord {
        FollowRecord {
            id: id.to_string(),
            name: format!("user {}", id),
            bio: "bio".to_string(),
            url: format!("https://img/{}.png", id),
            time,
        }
    }

    async fn file_store(dir: &tempfile::TempDir) -> SqliteStore {
        let url = format!("sqlite://{}", dir.path().join("follow.db").display());
        SqliteStore::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_get_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;

        store.add(&record("a", 1)).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().unwrap().url, "https://img/a.png");

        assert_eq!(store.update("a", &record("a", 5)).await.unwrap(), 1);
        assert_eq!(store.update("zzz", &record("zzz", 5)).await.unwrap(), 0);
        assert_eq!(store.get("a").await.unwrap().unwrap().time, 5);

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_onto_taken_id_is_duplicate() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        store.add(&record("a", 1)).await.unwrap();
        store.add(&record("b", 2)).await.unwrap();

        let result = store.update("a", &record("b", 3)).await;
        assert!(matches!(result, Err(StorageError::Duplicate(id)) if id == "b"));
        assert_eq!(store.get("a").await.unwrap().unwrap().time, 1);
        assert_eq!(store.get("b").await.unwrap().unwrap().time, 2);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_reported() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        store.add(&record("a", 1)).await.unwrap();

        let result = store.add(&record("a", 2)).await;
        assert!(matches!(result, Err(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_marker_roundtrip_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = file_store(&dir).await;
            assert_eq!(store.clock_marker().await.unwrap(), None);
            store.set_clock_marker(123).await.unwrap();
            store.set_clock_marker(456).await.unwrap();
            store.add(&record("kept", 1)).await.unwrap();
        }

        let reopened = file_store(&dir).await;
        assert_eq!(reopened.clock_marker().await.unwrap(), Some(456));
        assert!(reopened.exists("kept").await.unwrap());
    }

    #[tokio::test]
    async fn test_page_by_time_orders_descending() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        for i in 0..7 {
            store.add(&record(&format!("r{}", i), i * 10)).await.unwrap();
        }

        let page = store.page_by_time(SortOrder::Descending, 0, 3).await.unwrap();
        let times: Vec<i64> = page.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![60, 50, 40]);

        let tail = store.page_by_time(SortOrder::Descending, 6, 3).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].time, 0);
    }

    #[tokio::test]
    async fn test_replace_all_is_complete() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        store.add(&record("old-1", 1)).await.unwrap();
        store.add(&record("old-2", 2)).await.unwrap();
        store.set_clock_marker(2).await.unwrap();

        let incoming = vec![record("n1", 10), record("n2", 11), record("n3", 12)];
        store.replace_all(&incoming, 999).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        assert!(!store.exists("old-1").await.unwrap());
        assert_eq!(store.clock_marker().await.unwrap(), Some(999));

        let mut all = store.all().await.unwrap();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(all, incoming);
    }

    #[tokio::test]
    async fn test_clear_leaves_marker() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        store.add(&record("a", 1)).await.unwrap();
        store.set_clock_marker(5).await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.clock_marker().await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_connect_with_config_defaults_to_memory() {
        let store = SqliteStore::connect_with_config(&FollowSyncConfig::default()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
