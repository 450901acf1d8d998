//! Postgres persistence for the ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The [`SeaOrmLedgerStore`] implementation of the core store traits
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::SeaOrmLedgerStore;

use std::time::Duration;

use fundline_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    tracing::debug!(
        max_connections = config.max_connections,
        "connecting to database"
    );
    Database::connect(options).await
}
