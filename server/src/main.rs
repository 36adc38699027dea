use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mentorhub_relay::config::RelayConfig;
use mentorhub_relay::engine::relay::RelayEngine;
use mentorhub_relay::web::app_state::AppState;
use mentorhub_relay::web::router::build_router;

#[derive(Parser)]
#[command(
    name = "mentorhub-relay",
    about = "MentorHub realtime relay: chatroom, presence, and video-call signaling"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "relay.toml")]
    config: String,
    /// Override the listen address from the config file.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::load(&cli.config);
    if let Some(listen) = cli.listen {
        config.server.listen_address = listen;
    }

    let engine = Arc::new(RelayEngine::new(config.relay.outbound_queue));
    let listen_address = config.server.listen_address.clone();
    let state = Arc::new(AppState { engine, config });

    let app = build_router(state);

    info!("MentorHub relay listening on {}", listen_address);

    let listener = tokio::net::TcpListener::bind(&listen_address)
        .await
        .expect("failed to bind listener");

    // ConnectInfo gives the rate limiter the peer address of each upgrade.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
