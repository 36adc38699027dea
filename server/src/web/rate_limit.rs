use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::engine::throttle::ConnectionThrottle;

/// Extract client IP from request, only trusting proxy headers from loopback.
///
/// When the direct peer is a loopback address (127.0.0.1 or ::1), the connection
/// is coming through a local reverse proxy and we trust X-Forwarded-For / X-Real-IP.
/// Otherwise, we use the actual peer IP to prevent header spoofing that could
/// bypass rate limits.
fn client_ip(req: &Request<Body>) -> String {
    let peer_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0.ip());
    let from_loopback = peer_ip.is_some_and(|ip| ip.is_loopback());

    if from_loopback {
        if let Some(forwarded) = req.headers().get("x-forwarded-for")
            && let Ok(val) = forwarded.to_str()
            && let Some(first) = val.split(',').next()
        {
            return first.trim().to_string();
        }

        if let Some(real_ip) = req.headers().get("x-real-ip")
            && let Ok(val) = real_ip.to_str()
        {
            return val.trim().to_string();
        }
    }

    peer_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for WebSocket connection rate limiting. Refuses connection
/// storms before the upgrade; accepted connections are never throttled by
/// the relay itself.
pub async fn ws_rate_limit(req: Request<Body>, next: Next) -> Response {
    let throttle = req.extensions().get::<Arc<ConnectionThrottle>>();
    if let Some(throttle) = throttle {
        let ip = client_ip(&req);
        if !throttle.allow(&ip) {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many connections. Please try again later.",
            )
                .into_response();
        }
    }
    next.run(req).await
}
