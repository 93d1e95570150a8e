//! # Offline Track Cache
//!
//! Lets a playback client persist a track's bytes locally, keyed by its
//! stable track id, so later playback can use the local copy instead of
//! re-fetching a time-limited signed URL.
//!
//! ## Architecture
//!
//! Three layers, composed bottom-up:
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │  TrackAvailability (controller)           │
//! │  - resolve() / rebind()                   │
//! │  - make_available() / remove_available()  │
//! │  - watch-channel state for the UI         │
//! └────────┬──────────────────────────────────┘
//!          │
//! ┌────────┴──────────────────────────────────┐
//! │  CacheOrchestrator                        │
//! │  - fetch_and_cache() (network → store)    │
//! │  - open_source() (store → EphemeralSource)│
//! │  - evict()                                │
//! └────────┬──────────────────────────────────┘
//!          │
//! ┌────────┴──────────────────────────────────┐
//! │  TrackStore (durable key-value store)     │
//! │  - put / get / delete / list_ids / usage  │
//! └───────────────────────────────────────────┘
//! ```
//!
//! The controller also talks to a [`signer::SignedUrlProvider`] to obtain a
//! fresh time-limited download URL before every caching attempt; such URLs
//! expire and are never reused.
//!
//! ## Usage
//!
//! ```ignore
//! use core_offline::{CacheOrchestrator, SqliteTrackStore, TrackAvailability, TrackId};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteTrackStore::new(db));
//! store.initialize().await?;
//!
//! let orchestrator = Arc::new(CacheOrchestrator::new(store, http_client));
//! let controller = TrackAvailability::bind(
//!     orchestrator,
//!     signer,
//!     TrackId::new("t1"),
//!     "https://cdn/t1.mp3",
//! );
//! controller.resolve().await?;
//!
//! // user taps "make available offline"
//! controller.make_available().await?;
//! assert!(controller.state().is_cached);
//! ```

pub mod controller;
pub mod error;
pub mod handle;
pub mod models;
pub mod orchestrator;
pub mod signer;
pub mod store;

pub use controller::{AvailabilityState, TrackAvailability};
pub use error::{OfflineError, Result};
pub use handle::{EphemeralSource, SourceRegistry};
pub use models::{StoreUsage, StoredTrackRecord, TrackId};
pub use orchestrator::CacheOrchestrator;
pub use signer::{ApiSignedUrlProvider, SignedUrlProvider};
pub use store::{SqliteTrackStore, TrackStore};
