//! HTTP/WebSocket surface: the transport adapter in front of the relay
//! engine.

pub mod app_state;
pub mod rate_limit;
pub mod router;
pub mod ws_handler;
