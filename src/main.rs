//! Orbit Admin - content management and administration backend

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orbit_admin::{
    api::{self, AppState},
    config::Config,
    db,
};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orbit_admin=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Orbit Admin...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let pending = db::migrations::pending_count(&pool).await?;
    tracing::info!(
        pending,
        total = db::migrations::total_migrations(),
        "Checking database migrations"
    );
    db::migrations::run_migrations(&pool).await?;
    if !db::migrations::is_up_to_date(&pool).await? {
        anyhow::bail!("Database migrations did not complete");
    }
    tracing::info!("Database migrations completed");

    // Build application state and seed roles and the administrator
    let state = AppState::new(pool, &config);
    state.seed(&config).await?;
    tracing::info!("Identity seeding completed");

    // Purge expired sessions hourly
    {
        let users = state.users.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                match users.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Expired sessions purged"),
                    Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
