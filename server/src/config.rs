use std::path::Path;

use serde::Deserialize;
use tracing::info;

/// Top-level relay configuration, loaded from relay.toml.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerSection,
    pub relay: RelaySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen_address: String,
    /// Origin the browser clients are served from; CORS is narrowed to it
    /// unless it points at localhost.
    pub public_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:5000".into(),
            public_url: "http://localhost:3000".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    /// Outbound queue capacity per connection; events beyond it are dropped
    /// for that connection only.
    pub outbound_queue: usize,
    /// WebSocket connection throttle: burst per IP...
    pub ws_burst: u32,
    /// ...and seconds until one connection token returns.
    pub ws_refill_seconds: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            outbound_queue: 1024,
            ws_burst: 5,
            ws_refill_seconds: 12,
        }
    }
}

impl RelayConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LISTEN_ADDRESS") {
            self.server.listen_address = v;
        }
        // Deployment platforms hand out a bare port.
        if let Ok(v) = std::env::var("PORT")
            && v.parse::<u16>().is_ok()
        {
            self.server.listen_address = format!("0.0.0.0:{v}");
        }
        if let Ok(v) = std::env::var("PUBLIC_URL") {
            self.server.public_url = v;
        }
        if let Ok(v) = std::env::var("OUTBOUND_QUEUE")
            && let Ok(n) = v.parse()
        {
            self.relay.outbound_queue = n;
        }
        if let Ok(v) = std::env::var("WS_BURST")
            && let Ok(n) = v.parse()
        {
            self.relay.ws_burst = n;
        }
        if let Ok(v) = std::env::var("WS_REFILL_SECONDS")
            && let Ok(n) = v.parse()
        {
            self.relay.ws_refill_seconds = n;
        }
    }
}
