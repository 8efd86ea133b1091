use circlecall::config::{Config, StoreBackend};
use circlecall::domain::calling::{CallSessionManager, CallStore};
use circlecall::infrastructure::persistence::InMemoryCallStore;
use circlecall::interface::api::{build_router, init_metrics, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "postgres")]
use circlecall::infrastructure::persistence::{create_pool, run_migrations, PgCallStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    if std::env::args().any(|arg| arg == "--print-config") {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting circlecall call service");
    info!("Configuration loaded: {:?}", config.server);

    let store = create_store(&config).await?;
    let call_manager = Arc::new(CallSessionManager::with_max_update_attempts(
        store,
        config.calling.max_update_attempts,
    ));

    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics()?;

    let app = build_router(AppState { call_manager }, Some(prometheus_handle));
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("REST API server listening on {}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn CallStore>> {
    match config.database.backend {
        StoreBackend::Memory => {
            info!("Using in-memory call store");
            Ok(Arc::new(InMemoryCallStore::new()))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            info!("Initializing database connection...");
            let pool = create_pool(&config.database).await?;

            info!("Running database migrations...");
            run_migrations(&pool).await?;

            Ok(Arc::new(PgCallStore::new(pool)))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => {
            anyhow::bail!("postgres backend requested but built without the `postgres` feature")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down...");
}
