//! # Ephemeral Playback Sources
//!
//! An [`EphemeralSource`] is a transient, non-persisted handle over a cached
//! payload, usable directly as a playback source. It is the in-process
//! counterpart of a browser object URL: the [`SourceRegistry`] maps a
//! synthesized `memory:` URL to the payload bytes until the handle is
//! released.
//!
//! Ownership rules:
//! - a source is owned exclusively by the controller instance that created it
//! - it must be released exactly once; `release(self)` consumes the handle,
//!   so a double release does not compile
//! - sources are never persisted, serialized, or enumerated

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::models::TrackId;

struct RegisteredSource {
    payload: Bytes,
    mime_type: String,
}

/// Process-wide registry of live playback sources.
///
/// One registry is owned by each [`crate::CacheOrchestrator`]; playback
/// components resolve a source URL back to bytes through it.
pub struct SourceRegistry {
    sources: Mutex<HashMap<String, RegisteredSource>>,
}

impl SourceRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sources: Mutex::new(HashMap::new()),
        })
    }

    /// Register a payload and hand out a releasable source over it.
    pub(crate) fn register(
        self: &Arc<Self>,
        track_id: &TrackId,
        payload: Bytes,
        mime_type: String,
    ) -> EphemeralSource {
        let url = format!("memory://tracks/{}", Uuid::new_v4());
        debug!(%track_id, url = %url, "Registering ephemeral source");

        self.sources.lock().insert(
            url.clone(),
            RegisteredSource {
                payload,
                mime_type: mime_type.clone(),
            },
        );

        EphemeralSource {
            url,
            mime_type,
            registry: Arc::downgrade(self),
        }
    }

    /// Resolve a source URL to its payload and mime type.
    ///
    /// Returns `None` once the source has been released.
    pub fn resolve(&self, url: &str) -> Option<(Bytes, String)> {
        self.sources
            .lock()
            .get(url)
            .map(|s| (s.payload.clone(), s.mime_type.clone()))
    }

    /// Number of currently live sources.
    pub fn live_sources(&self) -> usize {
        self.sources.lock().len()
    }

    fn revoke(&self, url: &str) {
        trace!(url = %url, "Revoking ephemeral source");
        self.sources.lock().remove(url);
    }
}

/// An in-memory handle over cached bytes, usable by a playback component.
///
/// The handle's URL stays resolvable through its registry until
/// [`EphemeralSource::release`] is called. Using the URL after release
/// yields `None` from the registry.
#[derive(Debug)]
pub struct EphemeralSource {
    url: String,
    mime_type: String,
    registry: Weak<SourceRegistry>,
}

impl EphemeralSource {
    /// Playback-usable URL for this source.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Release the source, revoking its URL. Consumes the handle so the
    /// release happens exactly once.
    pub fn release(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.revoke(&self.url);
        }
    }
}
