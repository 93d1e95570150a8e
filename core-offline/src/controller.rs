//! # Track Availability Controller
//!
//! The per-track, per-consumer state machine a UI binds to. One instance is
//! bound to one `(track_id, fallback_url)` pair at a time and publishes its
//! state through a `watch` channel.
//!
//! States: unresolved on bind, then `Cached` or `NotCached`; `is_busy` marks
//! the transient caching phase entered only by [`TrackAvailability::make_available`].
//!
//! ## Supersession
//!
//! Every operation captures an epoch when it starts. The epoch is bumped at
//! the start of each new operation and on rebind/shutdown, and re-checked
//! under the state lock after every suspension point. A stale operation
//! never applies its result; any source it produced is released rather than
//! leaked. Teardown additionally trips a cancellation token so in-flight
//! work from a dropped binding can never resurface.
//!
//! Two independent controller instances bound to the same track are not
//! coordinated: both may fetch and both may write the store. The store's
//! last-write-wins semantics keep that safe, just wasteful.

use crate::error::{OfflineError, Result};
use crate::handle::EphemeralSource;
use crate::models::TrackId;
use crate::orchestrator::CacheOrchestrator;
use crate::signer::SignedUrlProvider;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Snapshot of what a play control should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityState {
    /// Current playback source: an ephemeral `memory:` URL when cached,
    /// otherwise the fallback network URL.
    pub source_url: String,
    pub is_cached: bool,
    pub is_busy: bool,
    /// Message of the last failed operation, cleared when one starts.
    pub error: Option<String>,
}

impl AvailabilityState {
    fn not_cached(fallback_url: String) -> Self {
        Self {
            source_url: fallback_url,
            is_cached: false,
            is_busy: false,
            error: None,
        }
    }

    fn cached(source_url: String) -> Self {
        Self {
            source_url,
            is_cached: true,
            is_busy: false,
            error: None,
        }
    }
}

/// Mutable bound identity plus the one source this instance owns.
///
/// The lock is never held across an await; async results re-acquire it and
/// re-check the epoch before applying anything. State is published to the
/// watch channel while the lock is still held (channel sends never block),
/// so an epoch check and the publish it guards are atomic: a stale
/// operation cannot pass its check, lose the CPU, and then overwrite the
/// state a later-issued operation already published.
struct Inner {
    track_id: TrackId,
    fallback_url: String,
    epoch: u64,
    held: Option<EphemeralSource>,
}

pub struct TrackAvailability {
    orchestrator: Arc<CacheOrchestrator>,
    signer: Arc<dyn SignedUrlProvider>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<AvailabilityState>,
    cancel: CancellationToken,
}

impl TrackAvailability {
    /// Bind a new controller instance to a track.
    ///
    /// The instance starts unresolved, reporting the fallback URL; call
    /// [`TrackAvailability::resolve`] to pick up an existing cached copy.
    pub fn bind(
        orchestrator: Arc<CacheOrchestrator>,
        signer: Arc<dyn SignedUrlProvider>,
        track_id: TrackId,
        fallback_url: impl Into<String>,
    ) -> Self {
        let fallback_url = fallback_url.into();
        let (state_tx, _) = watch::channel(AvailabilityState::not_cached(fallback_url.clone()));

        Self {
            orchestrator,
            signer,
            inner: Mutex::new(Inner {
                track_id,
                fallback_url,
                epoch: 0,
                held: None,
            }),
            state_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> AvailabilityState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AvailabilityState> {
        self.state_tx.subscribe()
    }

    /// Resolve whether the bound track is cached and publish the result.
    ///
    /// Runs on mount and after every track change. If a newer operation
    /// starts (or the instance is torn down) before resolution completes,
    /// the stale result is discarded and any source it produced is released.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Result<()> {
        let (epoch, track_id) = self.begin_operation();
        self.run_resolve(epoch, &track_id).await
    }

    /// Fetch the track via a freshly issued signed URL and cache it.
    ///
    /// A fresh URL is requested from the backend on every call; signed URLs
    /// are time-limited and never reused. On success the instance re-resolves
    /// to the newly stored record; on any failure it reverts to not-cached
    /// with the error surfaced, leaving no partial cache state. Not retried.
    #[instrument(skip(self))]
    pub async fn make_available(&self) -> Result<()> {
        let (epoch, track_id) = {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            self.state_tx.send_modify(|state| {
                state.is_busy = true;
                state.error = None;
            });
            (inner.epoch, inner.track_id.clone())
        };

        let result = self.cache_and_resolve(epoch, &track_id).await;

        if let Err(e) = &result {
            warn!(%track_id, error = %e, "make_available failed");
            let mut inner = self.inner.lock();
            if !self.cancel.is_cancelled() && inner.epoch == epoch {
                if let Some(old) = inner.held.take() {
                    old.release();
                }
                self.state_tx.send_replace(AvailabilityState {
                    error: Some(e.to_string()),
                    ..AvailabilityState::not_cached(inner.fallback_url.clone())
                });
            }
        }

        result
    }

    /// Evict the cached copy and revert to the fallback network URL.
    #[instrument(skip(self))]
    pub async fn remove_available(&self) -> Result<()> {
        let (epoch, track_id) = self.begin_operation();

        self.orchestrator.evict(&track_id).await?;

        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() || inner.epoch != epoch {
            return Ok(());
        }
        if let Some(old) = inner.held.take() {
            old.release();
        }
        self.state_tx
            .send_replace(AvailabilityState::not_cached(inner.fallback_url.clone()));
        drop(inner);

        info!(%track_id, "Track removed from offline cache");
        Ok(())
    }

    /// Re-bind this instance to a different track.
    ///
    /// Supersedes any in-flight operation, releases the held source, and
    /// resolves the new track.
    #[instrument(skip(self, fallback_url))]
    pub async fn rebind(&self, track_id: TrackId, fallback_url: impl Into<String>) -> Result<()> {
        let fallback_url = fallback_url.into();
        let epoch;
        {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            epoch = inner.epoch;
            inner.track_id = track_id.clone();
            inner.fallback_url = fallback_url.clone();
            if let Some(old) = inner.held.take() {
                old.release();
            }
            self.state_tx
                .send_replace(AvailabilityState::not_cached(fallback_url));
        }

        debug!(%track_id, "Rebound controller");
        self.run_resolve(epoch, &track_id).await
    }

    /// Tear the instance down, releasing any held source.
    ///
    /// Every code path that ends the instance's life runs this; `Drop` calls
    /// it as a last resort. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        if let Some(held) = inner.held.take() {
            held.release();
        }
    }

    fn begin_operation(&self) -> (u64, TrackId) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        (inner.epoch, inner.track_id.clone())
    }

    fn superseded(&self, epoch: u64) -> bool {
        self.cancel.is_cancelled() || self.inner.lock().epoch != epoch
    }

    async fn cache_and_resolve(&self, epoch: u64, track_id: &TrackId) -> Result<()> {
        let signed_url = self.signer.fresh_download_url(track_id).await?;
        if self.superseded(epoch) {
            debug!(%track_id, "Caching superseded before transfer");
            return Ok(());
        }

        self.orchestrator.fetch_and_cache(track_id, &signed_url).await?;
        if self.superseded(epoch) {
            debug!(%track_id, "Caching superseded after transfer");
            return Ok(());
        }

        // Re-resolve so the instance picks up the stored record.
        let source = self
            .orchestrator
            .open_source(track_id)
            .await?
            .ok_or_else(|| {
                OfflineError::Storage("Cached track missing after transfer".to_string())
            })?;

        let mut inner = self.inner.lock();
        if self.cancel.is_cancelled() || inner.epoch != epoch {
            drop(inner);
            source.release();
            return Ok(());
        }

        let source_url = source.url().to_string();
        if let Some(old) = inner.held.replace(source) {
            old.release();
        }
        self.state_tx
            .send_replace(AvailabilityState::cached(source_url));
        drop(inner);

        info!(%track_id, "Track available offline");
        Ok(())
    }

    async fn run_resolve(&self, epoch: u64, track_id: &TrackId) -> Result<()> {
        let opened = self.orchestrator.open_source(track_id).await;

        match opened {
            Ok(maybe_source) => {
                let mut inner = self.inner.lock();
                if self.cancel.is_cancelled() || inner.epoch != epoch {
                    drop(inner);
                    if let Some(source) = maybe_source {
                        source.release();
                    }
                    return Ok(());
                }

                match maybe_source {
                    Some(source) => {
                        let source_url = source.url().to_string();
                        if let Some(old) = inner.held.replace(source) {
                            old.release();
                        }
                        self.state_tx
                            .send_replace(AvailabilityState::cached(source_url));
                        drop(inner);
                        debug!(%track_id, "Resolved to cached copy");
                    }
                    None => {
                        if let Some(old) = inner.held.take() {
                            old.release();
                        }
                        self.state_tx
                            .send_replace(AvailabilityState::not_cached(
                                inner.fallback_url.clone(),
                            ));
                        drop(inner);
                        debug!(%track_id, "Resolved to network fallback");
                    }
                }
                Ok(())
            }
            Err(e) => {
                let inner = self.inner.lock();
                if self.cancel.is_cancelled() || inner.epoch != epoch {
                    return Ok(());
                }
                self.state_tx.send_replace(AvailabilityState {
                    error: Some(e.to_string()),
                    ..AvailabilityState::not_cached(inner.fallback_url.clone())
                });
                drop(inner);

                warn!(%track_id, error = %e, "Resolve failed");
                Err(e)
            }
        }
    }
}

impl Drop for TrackAvailability {
    fn drop(&mut self) {
        self.shutdown();
    }
}
