//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::upstream::RetryPolicy;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the back-office REST API
    pub upstream_url: String,
    /// Service name used as the cache key namespace for upstream calls
    pub upstream_service: String,
    /// Per-request timeout for upstream calls in milliseconds
    pub request_timeout_ms: u64,
    /// Total attempts per upstream call, first try included
    pub retry_max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub retry_base_delay_ms: u64,
    /// Upper bound for a single backoff delay in milliseconds
    pub retry_max_delay_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Back-office API base URL (default: http://localhost:8080)
    /// - `UPSTREAM_SERVICE` - Cache namespace for upstream calls (default: AdminApi)
    /// - `REQUEST_TIMEOUT_MS` - Upstream request timeout (default: 10000)
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per upstream call (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 1000)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap (default: 8000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            upstream_url: env_or("UPSTREAM_URL", defaults.upstream_url),
            upstream_service: env_or("UPSTREAM_SERVICE", defaults.upstream_service),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            retry_max_delay_ms: env_or("RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms),
        }
    }

    /// Backoff settings for upstream calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}

/// Reads and parses `name`, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl_ms: 300_000,
            server_port: 3000,
            upstream_url: "http://localhost:8080".to_string(),
            upstream_service: "AdminApi".to_string(),
            request_timeout_ms: 10_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 8_000,
        }
    }
}
