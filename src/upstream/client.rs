//! API Client Module
//!
//! Outbound HTTP to the back-office REST API, with read-through caching,
//! in-flight deduplication and retry on transient failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::upstream::{retry_with_backoff, RequestDeduplicator, RetryPolicy};

/// Builds the cache key for one upstream call: `<service>:<METHOD>:<url>`.
pub fn cache_key(service: &str, method: &Method, url: &str) -> String {
    format!("{}:{}:{}", service, method, url)
}

// == API Client ==
/// Client for one upstream service.
///
/// GET responses are cached under the service's namespace; any successful
/// write through this client invalidates the whole namespace and bumps its
/// generation. A GET started under an older generation is neither joined by
/// later readers nor stored.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    service: String,
    cache: CacheManager<Value>,
    dedup: Arc<RequestDeduplicator<Value>>,
    generation: Arc<AtomicU64>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client for `service` rooted at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        service: impl Into<String>,
        cache: CacheManager<Value>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service: service.into(),
            cache,
            dedup: Arc::new(RequestDeduplicator::new()),
            generation: Arc::new(AtomicU64::new(0)),
            retry,
        })
    }

    /// Creates a client from gateway configuration, sharing `cache`.
    pub fn from_config(config: &Config, cache: CacheManager<Value>) -> Result<Self> {
        Self::new(
            config.upstream_url.clone(),
            config.upstream_service.clone(),
            cache,
            config.retry_policy(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &CacheManager<Value> {
        &self.cache
    }

    /// Absolute URL for an API path such as `/products?page=2`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Cache namespace shared by every key this client writes.
    pub fn namespace(&self) -> String {
        format!("{}:", self.service)
    }

    // == Get JSON ==
    /// Fetches `path` through the cache.
    ///
    /// Misses for the same URL that overlap in time share one upstream call,
    /// unless a write to this service lands in between.
    pub async fn get_json(&self, path: &str, ttl_ms: Option<u64>) -> Result<Value> {
        let url = self.url(path);
        let key = cache_key(&self.service, &Method::GET, &url);

        if let Some(value) = self.cache.get(&key).await {
            return Ok(value);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let flight_key = format!("{}#{}", key, generation);
        let http = self.http.clone();
        let retry = self.retry;

        let value = self
            .dedup
            .run(&flight_key, move || async move {
                retry_with_backoff(&retry, "upstream GET", || {
                    send_request(http.clone(), Method::GET, url.clone(), None)
                })
                .await
            })
            .await?;

        let current = &self.generation;
        let stored = self
            .cache
            .set_if(&key, value.clone(), ttl_ms, || {
                current.load(Ordering::SeqCst) == generation
            })
            .await;
        if !stored {
            debug!(key = %key, "discarding response fetched before a write");
        }
        Ok(value)
    }

    // == Send JSON ==
    /// Sends a write (`POST`, `PUT`, `PATCH`, `DELETE`) to `path`.
    ///
    /// Only idempotent methods are retried. On success every cached response
    /// of this service is invalidated.
    pub async fn send_json(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path);
        let policy = if is_idempotent(&method) {
            self.retry
        } else {
            RetryPolicy::none()
        };

        let operation = format!("upstream {}", method);
        let response = retry_with_backoff(&policy, &operation, || {
            send_request(self.http.clone(), method.clone(), url.clone(), body.clone())
        })
        .await?;

        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = self.cache.invalidate_pattern(&self.namespace()).await;
        info!(%method, url = %url, removed, "upstream write invalidated cached responses");
        Ok(response)
    }
}

fn is_idempotent(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::PUT, Method::DELETE].contains(method)
}

/// Performs one HTTP exchange and decodes the JSON body.
///
/// Empty bodies decode as `null`.
async fn send_request(http: Client, method: Method, url: String, body: Option<Value>) -> Result<Value> {
    debug!(%method, url = %url, "calling upstream");

    let mut request = http.request(method, &url);
    if let Some(body) = &body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        return Err(GatewayError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Upstream {
        status: StatusCode::BAD_GATEWAY.as_u16(),
        message: format!("invalid upstream JSON: {}", e),
    })
}
