//! Fundline API Server
//!
//! Main entry point for the Fundline ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundline_api::{AppState, create_router};
use fundline_core::ledger::{LedgerPolicy, LedgerStore, MemoryLedgerStore};
use fundline_db::{SeaOrmLedgerStore, connect};
use fundline_shared::AppConfig;
use fundline_shared::config::StorageBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    let store: Arc<dyn LedgerStore> = match config.database.backend {
        StorageBackend::Postgres => {
            let db = connect(&config.database).await?;
            info!("Connected to database");
            Arc::new(SeaOrmLedgerStore::new(db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory ledger store; data is lost on exit");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let policy = LedgerPolicy::from(config.ledger);
    info!(
        enforce_latest_loan_first = policy.enforce_latest_loan_first,
        "Ledger policy configured"
    );

    // Create application state
    let state = AppState::new(store, policy, config.notifications.channel_capacity);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
