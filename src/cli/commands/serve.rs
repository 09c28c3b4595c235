use anyhow::Context;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::Database;
use crate::state::AppState;

/// Connect, migrate when configured, then serve until ctrl-c
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    info!("Starting Critterbase API in {:?} mode", config.environment);
    if crate::is_production!() && config.security.enable_cors && config.security.cors_origins.is_empty() {
        warn!("CORS allows any origin; set SECURITY_CORS_ORIGINS");
    }

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if config.database.run_migrations {
        db.migrate().await.context("failed to apply migrations")?;
    }

    let state = AppState::from_config(db.clone(), config).context("failed to build ITIS client")?;
    let app = crate::app(state, config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Critterbase API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
