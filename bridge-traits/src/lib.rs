//! # Platform Bridge Traits
//!
//! Abstraction seams between the offline cache core and the host platform.
//! The core crates depend only on these traits; concrete implementations
//! live in platform crates such as `bridge-desktop`.
//!
//! ## Modules
//!
//! - `http`: async HTTP client trait plus request/response value types
//! - `database`: async database adapter trait over positional-parameter SQL
//! - `error`: shared `BridgeError` type for all bridge operations

pub mod database;
pub mod error;
pub mod http;

pub use error::{BridgeError, Result};
