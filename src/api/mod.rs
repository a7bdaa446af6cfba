//! API Module
//!
//! HTTP handlers and routing for the gateway REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Cache statistics
//! - `PUT /cache/entries` - Store a value
//! - `GET|HEAD|DELETE /cache/entries/:key` - Read, probe or delete one entry
//! - `POST /cache/invalidate` - Drop every key under a prefix
//! - `POST /cache/clear` - Drop everything and reset counters
//! - `GET /api/*path` - Cached read from the upstream API
//! - `POST|PUT|PATCH|DELETE /api/*path` - Forwarded write, invalidates the namespace

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
