//! Backoffice Cache - read-through caching gateway for the back-office REST API
//!
//! Bounded in-memory cache with TTL expiry and LRU eviction, in front of
//! outbound calls to the admin dashboard's upstream service.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod upstream;

pub use api::AppState;
pub use cache::CacheManager;
pub use config::Config;
pub use error::{GatewayError, Result};
