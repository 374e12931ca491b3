//! Products API - read-only catalog over PostgreSQL

use axum_helpers::server::{close_postgres, create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    let state = AppState { db };

    let api_routes = api::routes(&state);
    let router =
        axum_helpers::create_router::<openapi::ApiDoc>(api_routes, config.server.request_timeout)
            .await?;
    // - /health: liveness with app name and version
    // - /ready: readiness with a real PostgreSQL round trip
    let app = router
        .merge(health_router(config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        app = config.app.name,
        version = config.app.version,
        port = config.server.port,
        "Starting Products API"
    );

    create_production_app(
        app,
        &config.server,
        Duration::from_secs(30),
        close_postgres(state.db, "catalog"),
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
