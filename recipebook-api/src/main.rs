//! # Recipe Book API Server
//!
//! HTTP API for sharing recipes: tag and ingredient catalogs, recipes with
//! ingredient amounts, favorites, a shopping cart with CSV export, author
//! subscriptions and avatars.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/recipebook \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p recipebook-api
//! ```

use recipebook_api::{
    app::{build_router, AppState},
    config::Config,
};
use recipebook_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "recipebook_api=debug,recipebook_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Recipe Book API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::new(config.database.url.clone())
    })
    .await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.media.root).await?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
