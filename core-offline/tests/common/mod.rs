//! Shared test doubles for the offline cache integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_offline::{
    OfflineError, Result, SignedUrlProvider, StoreUsage, StoredTrackRecord, TrackId, TrackStore,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

mockall::mock! {
    pub Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

mockall::mock! {
    pub Signer {}

    #[async_trait]
    impl SignedUrlProvider for Signer {
        async fn fresh_download_url(&self, track_id: &TrackId) -> Result<String>;
    }
}

/// In-memory [`TrackStore`] with the same last-write-wins semantics as the
/// sqlite store. `gate_gets` lets a test hold reads at a suspension point to
/// force a chosen interleaving.
pub struct MemoryTrackStore {
    records: Mutex<HashMap<TrackId, StoredTrackRecord>>,
    get_gate: Mutex<Option<Arc<Semaphore>>>,
    fail_puts: Mutex<bool>,
    fail_gets: Mutex<bool>,
}

impl MemoryTrackStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(HashMap::new()),
            get_gate: Mutex::new(None),
            fail_puts: Mutex::new(false),
            fail_gets: Mutex::new(false),
        })
    }

    /// Make every subsequent `get` wait for one permit on the returned
    /// semaphore before reading.
    pub fn gate_gets(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.get_gate.lock() = Some(gate.clone());
        gate
    }

    /// Make every subsequent `put` fail with a storage error.
    pub fn fail_puts(&self) {
        *self.fail_puts.lock() = true;
    }

    /// Make every subsequent `get` fail with a storage error.
    pub fn fail_gets(&self) {
        *self.fail_gets.lock() = true;
    }

    pub fn seed(&self, record: StoredTrackRecord) {
        self.records.lock().insert(record.track_id.clone(), record);
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.records.lock().contains_key(track_id)
    }
}

#[async_trait]
impl TrackStore for MemoryTrackStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, record: &StoredTrackRecord) -> Result<()> {
        if *self.fail_puts.lock() {
            return Err(OfflineError::Storage("disk full".to_string()));
        }
        self.records
            .lock()
            .insert(record.track_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, track_id: &TrackId) -> Result<Option<StoredTrackRecord>> {
        let gate = self.get_gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if *self.fail_gets.lock() {
            return Err(OfflineError::Storage("database is locked".to_string()));
        }
        Ok(self.records.lock().get(track_id).cloned())
    }

    async fn delete(&self, track_id: &TrackId) -> Result<()> {
        self.records.lock().remove(track_id);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<TrackId>> {
        Ok(self.records.lock().keys().cloned().collect())
    }

    async fn usage(&self) -> Result<StoreUsage> {
        let records = self.records.lock();
        Ok(StoreUsage {
            count: records.len(),
            total_bytes: records.values().map(|r| r.size_bytes).sum(),
        })
    }
}

/// Stub HTTP client with canned responses keyed by URL.
///
/// `gate_requests` holds every request at the network suspension point until
/// the test hands out permits, which is how the supersession tests control
/// which operation finishes first.
pub struct FakeHttpClient {
    stubs: Mutex<HashMap<String, CannedResponse>>,
    requests: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

#[derive(Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl FakeHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stubs: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        })
    }

    pub fn stub(&self, url: &str, status: u16, body: impl Into<Bytes>) {
        self.stub_with_headers(url, status, body, &[("content-type", "audio/mpeg")]);
    }

    pub fn stub_with_headers(
        &self,
        url: &str,
        status: u16,
        body: impl Into<Bytes>,
        headers: &[(&str, &str)],
    ) {
        self.stubs.lock().insert(
            url.to_string(),
            CannedResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.into(),
            },
        );
    }

    pub fn gate_requests(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().push(request.url.clone());

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        match self.stubs.lock().get(&request.url) {
            Some(canned) => Ok(HttpResponse {
                status: canned.status,
                headers: canned.headers.clone(),
                body: canned.body.clone(),
            }),
            None => Err(BridgeError::OperationFailed(format!(
                "no stub for {}",
                request.url
            ))),
        }
    }
}

pub fn sample_record(track_id: &str, payload: &'static [u8]) -> StoredTrackRecord {
    StoredTrackRecord {
        track_id: TrackId::new(track_id),
        payload: Bytes::from_static(payload),
        mime_type: "audio/mpeg".to_string(),
        size_bytes: payload.len() as u64,
        etag: Some("\"etag-1\"".to_string()),
        last_modified: Some("Wed, 01 Jan 2025 00:00:00 GMT".to_string()),
        saved_at: 1_700_000_000,
    }
}
