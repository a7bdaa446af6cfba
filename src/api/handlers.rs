//! API Handlers
//!
//! HTTP request handlers for cache administration and the upstream proxy.

use axum::{
    extract::{Path, RawQuery, State},
    http::{Method, StatusCode},
    Json,
};
use serde_json::Value;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, InvalidateRequest,
    InvalidateResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::upstream::ApiClient;

/// Application state shared across all handlers.
///
/// The client holds a clone of `cache`, so proxied responses and the admin
/// endpoints see the same entries.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheManager<Value>,
    pub client: ApiClient,
}

impl AppState {
    /// Creates a new AppState with the given cache and upstream client.
    pub fn new(cache: CacheManager<Value>, client: ApiClient) -> Self {
        Self { cache, client }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = CacheManager::new(config.max_entries, config.default_ttl_ms);
        let client = ApiClient::from_config(config, cache.clone())?;
        Ok(Self::new(cache, client))
    }
}

/// Handler for PUT /cache/entries
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key.clone(), req.value, req.ttl_ms).await;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(GatewayError::NotFound(key)),
    }
}

/// Handler for HEAD /cache/entries/:key
///
/// Existence check that leaves recency and hit/miss counters alone.
pub async fn head_handler(State(state): State<AppState>, Path(key): Path<String>) -> StatusCode {
    if state.cache.has(&key).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Handler for DELETE /cache/entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(GatewayError::NotFound(key))
    }
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(GatewayError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate_pattern(&req.prefix).await;

    Ok(Json(InvalidateResponse {
        prefix: req.prefix,
        removed,
    }))
}

/// Handler for POST /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear().await;
    Json(ClearResponse::new())
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/*path
///
/// Read-through fetch from the upstream API.
pub async fn proxy_get_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>> {
    let value = state
        .client
        .get_json(&upstream_path(&path, query.as_deref()), None)
        .await?;
    Ok(Json(value))
}

/// Handler for POST/PUT/PATCH/DELETE /api/*path
///
/// Forwards the write and drops the service's cached responses.
pub async fn proxy_write_handler(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    body: Option<Json<Value>>,
) -> Result<Json<Value>> {
    let value = state
        .client
        .send_json(
            method,
            &upstream_path(&path, query.as_deref()),
            body.map(|Json(v)| v),
        )
        .await?;
    Ok(Json(value))
}

fn upstream_path(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("/{}?{}", path.trim_start_matches('/'), q),
        _ => format!("/{}", path.trim_start_matches('/')),
    }
}
