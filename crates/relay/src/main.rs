//! The relay server.

#[macro_use]
extern crate tracing;

use chat_relay::{Relay, RelayConfigBuilder, TOKEN_VARS, UpstreamClient};
use chat_relay_hf_model::HfProvider;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chat_relay=debug".into()),
        )
        .with_target(false)
        .init();

    let config = RelayConfigBuilder::from_env().build();
    info!("provider token configured: {}", config.has_token());
    if !config.has_token() {
        warn!("Hugging Face token is not configured!");
        warn!("Set one of {TOKEN_VARS:?}; chat requests fail until then.");
    }

    let provider = HfProvider::new(config.hf_config());
    let addr = config.addr();
    let model_name = provider.config().display_name();
    let relay = Relay::new(config, UpstreamClient::new(provider));

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind to {addr}: {err}");
            return;
        }
    };

    let port = addr.port();
    info!("relay is running on port {port}");
    info!("health: http://localhost:{port}/api/health");
    info!("streaming: http://localhost:{port}/api/chat/stream");
    info!("model: {model_name}");

    if let Err(err) =
        axum::serve(listener, chat_relay::http::router(relay)).await
    {
        error!("server stopped: {err}");
    }
}
