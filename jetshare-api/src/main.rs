use anyhow::Context;
use jetshare_api::{app, AppState, AuthConfig};
use jetshare_store::{app_config::Config, Backends};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "jetshare_api=debug,jetshare_store=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting JetShare API on port {}", config.server.port);

    let backends = Backends::from_config(&config)
        .await
        .context("Failed to initialise backends")?;
    let state = AppState::new(backends, AuthConfig::from(&config.auth));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
