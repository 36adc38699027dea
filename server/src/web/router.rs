use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

use super::app_state::AppState;
use super::rate_limit::ws_rate_limit;
use super::ws_handler;
use crate::engine::throttle::ConnectionThrottle;

/// Build the axum router: the WebSocket relay endpoint plus a liveness probe.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Restrict CORS to the configured public_url origin (or allow any for localhost dev)
    let public_url = &state.config.server.public_url;
    let cors = if public_url.contains("localhost") || public_url.contains("127.0.0.1") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origin = public_url
            .parse::<HeaderValue>()
            .unwrap_or_else(|_| HeaderValue::from_static("https://localhost"));
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let throttle = Arc::new(ConnectionThrottle::new(
        state.config.relay.ws_burst,
        Duration::from_secs(state.config.relay.ws_refill_seconds),
    ));

    // WebSocket — connection rate limit
    let ws_routes = Router::new()
        .route("/ws", axum::routing::get(ws_handler::ws_upgrade))
        .layer(axum::middleware::from_fn(ws_rate_limit));

    Router::new()
        .merge(ws_routes)
        .route("/healthz", axum::routing::get(healthz))
        .layer(cors)
        .layer(axum::Extension(throttle))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
