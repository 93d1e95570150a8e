//! # Offline Cache Data Model

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable logical identifier for one media asset, independent of its storage
/// location or any signed-URL value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The persisted representation of one track's bytes plus metadata.
///
/// At most one record exists per track id; a `put` with an existing key
/// replaces the prior record whole. The payload is never partially written:
/// a transfer either completes and is stored whole, or fails and nothing is
/// stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTrackRecord {
    pub track_id: TrackId,

    /// Raw media bytes, opaque to the cache.
    pub payload: Bytes,

    /// Content type captured at fetch time; needed to reconstruct a
    /// playable source later.
    pub mime_type: String,

    pub size_bytes: u64,

    /// Transfer metadata captured for potential staleness checks.
    /// Advisory only; never used to invalidate.
    pub etag: Option<String>,
    pub last_modified: Option<String>,

    /// Unix timestamp (seconds) of when the record was stored.
    pub saved_at: i64,
}

/// Aggregate store usage, for diagnostics. Not enforced as a quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreUsage {
    pub count: usize,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_display_and_access() {
        let id = TrackId::new("track-42");
        assert_eq!(id.as_str(), "track-42");
        assert_eq!(id.to_string(), "track-42");
        assert_eq!(TrackId::from("track-42"), id);
    }

    #[test]
    fn test_store_usage_default() {
        let usage = StoreUsage::default();
        assert_eq!(usage.count, 0);
        assert_eq!(usage.total_bytes, 0);
    }
}
