//! End-to-end wiring of the offline cache against a real backend.
//!
//! ```sh
//! API_BASE_URL=https://api.example.com API_TOKEN=... \
//!     cargo run --example offline_cli -- <track-id> <fallback-url>
//! ```

use bridge_desktop::{ReqwestHttpClient, SqliteAdapter};
use bridge_traits::database::DatabaseConfig;
use core_offline::{
    ApiSignedUrlProvider, CacheOrchestrator, SqliteTrackStore, TrackAvailability, TrackId,
    TrackStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let track_id = args.next().unwrap_or_else(|| "demo-track".to_string());
    let fallback_url = args
        .next()
        .unwrap_or_else(|| "https://cdn.example.com/demo.mp3".to_string());
    let api_base = std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let api_token = std::env::var("API_TOKEN").unwrap_or_default();

    let db = Arc::new(SqliteAdapter::new(DatabaseConfig::new("offline.db")).await?);
    let store = Arc::new(SqliteTrackStore::new(db));
    store.initialize().await?;

    let http = Arc::new(ReqwestHttpClient::new());
    let orchestrator = Arc::new(CacheOrchestrator::new(store.clone(), http.clone()));
    let signer = Arc::new(ApiSignedUrlProvider::new(http, api_base, api_token));

    let controller = TrackAvailability::bind(
        orchestrator,
        signer,
        TrackId::new(track_id),
        fallback_url,
    );

    controller.resolve().await?;
    println!("after resolve:        {:?}", controller.state());

    controller.make_available().await?;
    println!("after make_available: {:?}", controller.state());

    let usage = store.usage().await?;
    println!("store usage: {} track(s), {} bytes", usage.count, usage.total_bytes);

    controller.shutdown();
    Ok(())
}
