//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, head_handler, health_handler, invalidate_handler,
    proxy_get_handler, proxy_write_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, the dashboard is served from another host
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/entries", put(set_handler))
        .route(
            "/cache/entries/:key",
            get(get_handler).head(head_handler).delete(delete_handler),
        )
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cache/clear", post(clear_handler))
        .route(
            "/api/*path",
            get(proxy_get_handler)
                .post(proxy_write_handler)
                .put(proxy_write_handler)
                .patch(proxy_write_handler)
                .delete(proxy_write_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
