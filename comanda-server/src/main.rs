//! comanda-server: multi-tenant order-management backend
//!
//! Long-running service that:
//! - Stores versioned tenant catalog data with optimistic concurrency
//! - Reconciles offline client mutation queues against the change ledger
//! - Processes order transactions atomically
//! - Fans committed changes out to live tenant sessions over WebSocket

use comanda_server::api;
use comanda_server::config::Config;
use comanda_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comanda_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Starting comanda-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("comanda-server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
