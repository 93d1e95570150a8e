//! Tests for the sqlite-backed durable track store.

use bridge_desktop::SqliteAdapter;
use bridge_traits::database::DatabaseConfig;
use bytes::Bytes;
use core_offline::{SqliteTrackStore, StoredTrackRecord, TrackId, TrackStore};
use std::sync::Arc;

async fn new_store() -> SqliteTrackStore {
    let adapter = SqliteAdapter::new(DatabaseConfig::in_memory())
        .await
        .expect("in-memory adapter");
    let store = SqliteTrackStore::new(Arc::new(adapter));
    store.initialize().await.expect("schema");
    store
}

fn record(track_id: &str, payload: &'static [u8]) -> StoredTrackRecord {
    StoredTrackRecord {
        track_id: TrackId::new(track_id),
        payload: Bytes::from_static(payload),
        mime_type: "audio/mpeg".to_string(),
        size_bytes: payload.len() as u64,
        etag: Some("\"v1\"".to_string()),
        last_modified: None,
        saved_at: 1_700_000_000,
    }
}

#[tokio::test]
async fn test_put_then_get_round_trips() {
    let store = new_store().await;
    let stored = record("t1", b"media-bytes");

    store.put(&stored).await.unwrap();
    let loaded = store.get(&TrackId::new("t1")).await.unwrap().unwrap();

    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let store = new_store().await;
    assert!(store.get(&TrackId::new("absent")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = new_store().await;

    // Deleting an absent key is not an error.
    store.delete(&TrackId::new("t1")).await.unwrap();

    store.put(&record("t1", b"abc")).await.unwrap();
    store.delete(&TrackId::new("t1")).await.unwrap();
    assert!(store.get(&TrackId::new("t1")).await.unwrap().is_none());

    store.delete(&TrackId::new("t1")).await.unwrap();
}

#[tokio::test]
async fn test_put_replaces_existing_record_whole() {
    let store = new_store().await;
    store.put(&record("t1", b"first")).await.unwrap();

    let replacement = StoredTrackRecord {
        track_id: TrackId::new("t1"),
        payload: Bytes::from_static(b"second-version"),
        mime_type: "audio/ogg".to_string(),
        size_bytes: 14,
        etag: None,
        last_modified: Some("Thu, 02 Jan 2025 00:00:00 GMT".to_string()),
        saved_at: 1_700_000_500,
    };
    store.put(&replacement).await.unwrap();

    let loaded = store.get(&TrackId::new("t1")).await.unwrap().unwrap();
    assert_eq!(loaded, replacement);

    let usage = store.usage().await.unwrap();
    assert_eq!(usage.count, 1);
    assert_eq!(usage.total_bytes, 14);
}

#[tokio::test]
async fn test_list_ids_and_usage() {
    let store = new_store().await;
    store.put(&record("t1", b"aa")).await.unwrap();
    store.put(&record("t2", b"bbbb")).await.unwrap();
    store.put(&record("t3", b"cccccc")).await.unwrap();

    let mut ids: Vec<String> = store
        .list_ids()
        .await
        .unwrap()
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    let usage = store.usage().await.unwrap();
    assert_eq!(usage.count, 3);
    assert_eq!(usage.total_bytes, 12);
}

#[tokio::test]
async fn test_usage_on_empty_store() {
    let store = new_store().await;
    let usage = store.usage().await.unwrap();
    assert_eq!(usage.count, 0);
    assert_eq!(usage.total_bytes, 0);
    assert!(store.list_ids().await.unwrap().is_empty());
}
