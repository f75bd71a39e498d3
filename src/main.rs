use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use xero_connect::XeroClient;
use xero_connect::app::{AppConfig, MemorySessionStore, app_routes};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();

    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::warn!(error = %e, "Could not load .env file"),
    }

    let config = AppConfig::from_env().context(
        "Environment variables not all set - check the .env file in the project root",
    )?;

    let client = XeroClient::new(config.oauth.clone());
    let app = app_routes(config.settings.clone(), client, MemorySessionStore::new());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "App listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xero_connect=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
