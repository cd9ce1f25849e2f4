// src/main.rs

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rtrwh_api::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rtrwh_api=debug,tower_http=debug")),
        )
        .init();

    // Loads .env if present
    let config = Config::from_env()?;
    let addr = config.address();
    info!(app = %config.app_name, env = %config.app_env, "starting");

    let state = AppState::from_config(config).await?;
    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("API listening on http://{addr}");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
