//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `DatabaseAdapter` using `sqlx` with the native SQLite driver
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteAdapter};
//! use bridge_traits::database::DatabaseConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let db = SqliteAdapter::new(DatabaseConfig::new("offline.db")).await?;
//! }
//! ```

mod database;
mod http;

pub use database::SqliteAdapter;
pub use http::ReqwestHttpClient;
