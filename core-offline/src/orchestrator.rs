//! # Cache Orchestrator
//!
//! Bridges network transfer and durable storage, and turns stored bytes into
//! ephemeral playback sources.
//!
//! The orchestrator performs a single GET attempt per caching request. A
//! non-2xx response or a network failure means caching did not happen and no
//! partial record is left behind; the store is only touched after the whole
//! body has arrived.

use crate::error::{OfflineError, Result};
use crate::handle::{EphemeralSource, SourceRegistry};
use crate::models::{StoredTrackRecord, TrackId};
use crate::store::TrackStore;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const FALLBACK_MIME: &str = "application/octet-stream";

pub struct CacheOrchestrator {
    store: Arc<dyn TrackStore>,
    http: Arc<dyn HttpClient>,
    registry: Arc<SourceRegistry>,
}

impl CacheOrchestrator {
    pub fn new(store: Arc<dyn TrackStore>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            store,
            http,
            registry: SourceRegistry::new(),
        }
    }

    /// Registry that playback components use to resolve source URLs.
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Download a track's bytes and persist them as one whole record.
    ///
    /// `source_url` is caller-supplied and may be time-limited; the
    /// orchestrator neither validates nor reuses it. One attempt only.
    #[instrument(skip(self, source_url), fields(track_id = %track_id))]
    pub async fn fetch_and_cache(&self, track_id: &TrackId, source_url: &str) -> Result<()> {
        debug!("Fetching track bytes");

        let request = HttpRequest::new(HttpMethod::Get, source_url);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| OfflineError::Transfer(format!("Download failed: {}", e)))?;

        if !response.is_success() {
            warn!(status = response.status, "Track download rejected");
            return Err(OfflineError::Transfer(format!(
                "Download failed with status {}",
                response.status
            )));
        }

        let mime_type = response
            .header("content-type")
            .filter(|v| !v.is_empty())
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let etag = response.header("etag").map(str::to_string);
        let last_modified = response.header("last-modified").map(str::to_string);

        let record = StoredTrackRecord {
            track_id: track_id.clone(),
            size_bytes: response.body.len() as u64,
            payload: response.body,
            mime_type,
            etag,
            last_modified,
            saved_at: chrono::Utc::now().timestamp(),
        };

        self.store.put(&record).await?;

        info!(
            size_bytes = record.size_bytes,
            mime_type = %record.mime_type,
            "Track cached"
        );
        Ok(())
    }

    /// Open an ephemeral playback source over a stored record.
    ///
    /// Returns `Ok(None)` when the track is not cached; that is a normal
    /// outcome, not an error. The returned source must be released exactly
    /// once by its owner.
    #[instrument(skip(self))]
    pub async fn open_source(&self, track_id: &TrackId) -> Result<Option<EphemeralSource>> {
        let record = match self.store.get(track_id).await? {
            Some(record) => record,
            None => {
                debug!("Track not cached");
                return Ok(None);
            }
        };

        let source = self
            .registry
            .register(track_id, record.payload, record.mime_type);
        Ok(Some(source))
    }

    /// Remove a track's record from the store.
    ///
    /// Does not revoke sources already handed out for the track; their
    /// owners remain responsible for releasing them.
    #[instrument(skip(self))]
    pub async fn evict(&self, track_id: &TrackId) -> Result<()> {
        self.store.delete(track_id).await?;
        info!("Track evicted from cache");
        Ok(())
    }
}
