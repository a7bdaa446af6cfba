//! Upstream Module
//!
//! Calls to the back-office REST API that the gateway caches.
//!
//! # Components
//! - `ApiClient`: read-through GETs and namespace-invalidating writes
//! - `RequestDeduplicator`: shares one in-flight call between concurrent callers
//! - `retry_with_backoff`: exponential backoff for transient failures

mod client;
mod dedup;
mod retry;

pub use client::{cache_key, ApiClient};
pub use dedup::RequestDeduplicator;
pub use retry::{retry_with_backoff, RetryPolicy};
