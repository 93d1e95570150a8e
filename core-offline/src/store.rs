//! # Durable Track Store
//!
//! Key-value persistence of [`StoredTrackRecord`], surviving application
//! restarts. The payload is stored as a BLOB column next to its metadata so
//! a record is always written and deleted as one unit.
//!
//! The store owns no network or UI concerns, never retries, and is shared by
//! all controller instances in the process. Last write wins per key.

use crate::error::{OfflineError, Result};
use crate::models::{StoreUsage, StoredTrackRecord, TrackId};
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Persistence trait for stored track records.
#[async_trait::async_trait]
pub trait TrackStore: Send + Sync {
    /// Create the backing schema if needed.
    async fn initialize(&self) -> Result<()>;

    /// Durably write a record, replacing any existing record with the same
    /// track id.
    async fn put(&self, record: &StoredTrackRecord) -> Result<()>;

    /// Look up a record. A missing key is a normal outcome, not an error.
    async fn get(&self, track_id: &TrackId) -> Result<Option<StoredTrackRecord>>;

    /// Delete a record. Deleting an absent key is not an error.
    async fn delete(&self, track_id: &TrackId) -> Result<()>;

    /// Enumerate all stored track ids, unordered.
    async fn list_ids(&self) -> Result<Vec<TrackId>>;

    /// Aggregate record count and payload bytes across the store.
    async fn usage(&self) -> Result<StoreUsage>;
}

/// SQLite implementation of [`TrackStore`].
pub struct SqliteTrackStore {
    db: Arc<dyn DatabaseAdapter>,
}

impl SqliteTrackStore {
    /// Create a new store over the given database adapter.
    pub fn new(db: Arc<dyn DatabaseAdapter>) -> Self {
        Self { db }
    }

    /// Convert a QueryRow to a StoredTrackRecord.
    fn row_to_record(row: &QueryRow) -> Result<StoredTrackRecord> {
        Ok(StoredTrackRecord {
            track_id: TrackId::new(get_string(row, "track_id")?),
            payload: Bytes::from(get_blob(row, "payload")?),
            mime_type: get_string(row, "mime_type")?,
            size_bytes: get_i64(row, "size_bytes")? as u64,
            etag: get_optional_string(row, "etag")?,
            last_modified: get_optional_string(row, "last_modified")?,
            saved_at: get_i64(row, "saved_at")?,
        })
    }
}

#[async_trait::async_trait]
impl TrackStore for SqliteTrackStore {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<()> {
        debug!("Initializing offline track store");

        let statements = [(
            "CREATE TABLE IF NOT EXISTS offline_tracks (
                track_id TEXT PRIMARY KEY NOT NULL,
                payload BLOB NOT NULL,
                mime_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                etag TEXT,
                last_modified TEXT,
                saved_at INTEGER NOT NULL
            )",
            &[] as &[QueryValue],
        )];

        self.db.execute_batch(&statements).await.map_err(|e| {
            error!("Failed to create offline_tracks table: {}", e);
            OfflineError::Storage(format!("Failed to initialize store: {}", e))
        })?;

        debug!("Offline track store initialized");
        Ok(())
    }

    #[instrument(skip(self, record), fields(track_id = %record.track_id, size_bytes = record.size_bytes))]
    async fn put(&self, record: &StoredTrackRecord) -> Result<()> {
        let sql = r#"
            INSERT OR REPLACE INTO offline_tracks (
                track_id, payload, mime_type, size_bytes, etag, last_modified, saved_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;

        let params = vec![
            QueryValue::Text(record.track_id.to_string()),
            QueryValue::Blob(record.payload.to_vec()),
            QueryValue::Text(record.mime_type.clone()),
            QueryValue::Integer(record.size_bytes as i64),
            record
                .etag
                .as_ref()
                .map(|s| QueryValue::Text(s.clone()))
                .unwrap_or(QueryValue::Null),
            record
                .last_modified
                .as_ref()
                .map(|s| QueryValue::Text(s.clone()))
                .unwrap_or(QueryValue::Null),
            QueryValue::Integer(record.saved_at),
        ];

        self.db.execute(sql, &params).await.map_err(|e| {
            error!("Failed to write track record: {}", e);
            OfflineError::Storage(format!("Failed to write track record: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, track_id: &TrackId) -> Result<Option<StoredTrackRecord>> {
        let sql = "SELECT * FROM offline_tracks WHERE track_id = ?";
        let params = vec![QueryValue::Text(track_id.to_string())];

        let row = self.db.query_one_optional(sql, &params).await.map_err(|e| {
            error!("Failed to read track record: {}", e);
            OfflineError::Storage(format!("Failed to read track record: {}", e))
        })?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    #[instrument(skip(self))]
    async fn delete(&self, track_id: &TrackId) -> Result<()> {
        let sql = "DELETE FROM offline_tracks WHERE track_id = ?";
        let params = vec![QueryValue::Text(track_id.to_string())];

        self.db.execute(sql, &params).await.map_err(|e| {
            error!("Failed to delete track record: {}", e);
            OfflineError::Storage(format!("Failed to delete track record: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_ids(&self) -> Result<Vec<TrackId>> {
        let sql = "SELECT track_id FROM offline_tracks";

        let rows = self.db.query(sql, &[]).await.map_err(|e| {
            error!("Failed to list track ids: {}", e);
            OfflineError::Storage(format!("Failed to list track ids: {}", e))
        })?;

        rows.iter()
            .map(|row| Ok(TrackId::new(get_string(row, "track_id")?)))
            .collect()
    }

    #[instrument(skip(self))]
    async fn usage(&self) -> Result<StoreUsage> {
        let sql = r#"
            SELECT
                COUNT(*) as count,
                COALESCE(SUM(size_bytes), 0) as total_bytes
            FROM offline_tracks
        "#;

        let row = self
            .db
            .query_one_optional(sql, &[])
            .await
            .map_err(|e| {
                error!("Failed to get store usage: {}", e);
                OfflineError::Storage(format!("Failed to get store usage: {}", e))
            })?
            .unwrap_or_default();

        Ok(StoreUsage {
            count: get_i64(&row, "count").unwrap_or(0) as usize,
            total_bytes: get_i64(&row, "total_bytes").unwrap_or(0) as u64,
        })
    }
}

// ============================================================================
// Helper functions for extracting values from QueryRow
// ============================================================================

fn get_string(row: &QueryRow, key: &str) -> Result<String> {
    row.get(key)
        .and_then(|value| value.as_string())
        .ok_or_else(|| OfflineError::Storage(format!("Missing column: {}", key)))
}

fn get_optional_string(row: &QueryRow, key: &str) -> Result<Option<String>> {
    Ok(match row.get(key) {
        Some(QueryValue::Null) | None => None,
        Some(value) => Some(value.as_string().ok_or_else(|| {
            OfflineError::Storage(format!("Invalid type for column: {}", key))
        })?),
    })
}

fn get_i64(row: &QueryRow, key: &str) -> Result<i64> {
    row.get(key)
        .and_then(|value| value.as_i64())
        .ok_or_else(|| OfflineError::Storage(format!("Missing column: {}", key)))
}

fn get_blob(row: &QueryRow, key: &str) -> Result<Vec<u8>> {
    row.get(key)
        .and_then(|value| value.as_bytes().map(|b| b.to_vec()))
        .ok_or_else(|| OfflineError::Storage(format!("Missing column: {}", key)))
}
