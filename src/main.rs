// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use quiz_backend::config::{ATTEMPT_SWEEP_INTERVAL_SECS, Config};
use quiz_backend::generator::{DynGenerator, ProcessGenerator};
use quiz_backend::quiz::registry::{AttemptRegistry, spawn_sweeper};
use quiz_backend::routes;
use quiz_backend::state::AppState;
use quiz_backend::store::{DynStore, MemoryStore, PgStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: DynStore = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await?;
            tracing::info!("Database connected...");

            // Run Migrations Automatically
            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
                tracing::error!("Failed to run database migrations: {}", e);
                e
            })?;
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on restart.");
            Arc::new(MemoryStore::new())
        }
    };

    let generator: DynGenerator = Arc::new(ProcessGenerator::from_config(&config));

    let attempts = Arc::new(AttemptRegistry::new());
    spawn_sweeper(
        attempts.clone(),
        Duration::from_secs(config.attempt_retention_secs),
        Duration::from_secs(ATTEMPT_SWEEP_INTERVAL_SECS),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState {
        store,
        generator,
        attempts,
        config,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Connects to PostgreSQL, retrying while the database starts up.
async fn connect_with_retry(url: &str) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
