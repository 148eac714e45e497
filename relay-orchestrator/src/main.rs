use std::sync::Arc;

use anyhow::Context;
use relay_orchestrator::api::{self, AppState};
use relay_orchestrator::config::{Config, DispatcherKind, StoreBackend};
use relay_orchestrator::db;
use relay_orchestrator::dispatcher::{Dispatcher, InMemoryDispatcher, PodmanDispatcher};
use relay_orchestrator::repository::{
    MemoryStore, PgJobRepository, PgMessageRepository, PgProgramRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Relay Orchestrator...");

    let config = Config::from_env()?;

    let dispatcher: Arc<dyn Dispatcher> = match config.dispatcher {
        DispatcherKind::Podman(podman) => {
            tracing::info!("Launching execution units with podman ({})", podman.image);
            Arc::new(PodmanDispatcher::new(podman))
        }
        DispatcherKind::Memory => {
            tracing::warn!("In-memory dispatcher selected; submitted jobs will not run");
            Arc::new(InMemoryDispatcher::new())
        }
    };

    let state = match config.store {
        StoreBackend::Postgres {
            url,
            max_connections,
        } => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(&url, max_connections)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            AppState::new(
                Arc::new(PgJobRepository::new(pool.clone())),
                Arc::new(PgMessageRepository::new(pool.clone())),
                Arc::new(PgProgramRepository::new(pool)),
                dispatcher,
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("In-memory store selected; state is lost on restart");
            let store = Arc::new(MemoryStore::new());
            AppState::new(store.clone(), store.clone(), store, dispatcher)
        }
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
