//! # abcall-gateway -- Binary Entry Point
//!
//! Loads `.env`, initializes tracing, reads configuration and serves the
//! gateway on `0.0.0.0:$PORT` (default 8001).

use abcall_gateway::state::{AppConfig, AppState};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("configuration error: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");

    let db_pool = abcall_gateway::db::init_pool(config.database_url.as_deref()).map_err(|e| {
        tracing::error!("database pool configuration failed: {e}");
        e
    })?;

    let port = config.port;
    let state = AppState::new(config)
        .map_err(|e| {
            tracing::error!("downstream client initialization failed: {e}");
            e
        })?
        .with_db_pool(db_pool);

    let app = abcall_gateway::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("user-management gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(abcall_gateway::shutdown::signal())
        .await?;

    Ok(())
}
