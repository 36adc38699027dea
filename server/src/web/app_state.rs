use std::sync::Arc;

use crate::config::RelayConfig;
use crate::engine::relay::RelayEngine;

/// Shared state injected into every handler.
pub struct AppState {
    pub engine: Arc<RelayEngine>,
    pub config: RelayConfig,
}
