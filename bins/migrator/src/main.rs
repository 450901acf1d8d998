//! Schema migration runner for Fundline.
//!
//! Connects with the same configuration the server uses (`FUNDLINE__DATABASE__URL`).
//!
//! Usage:
//!   migrator [up]   - Apply pending migrations
//!   migrator down   - Roll back the last migration
//!   migrator status - List applied and pending migrations
//!   migrator fresh  - Drop everything and re-apply all migrations

use anyhow::{Context, bail};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundline_db::migration::Migrator;
use fundline_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "migrator=info,sea_orm_migration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = fundline_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("unknown command `{other}`, expected one of up, down, status, fresh"),
    }

    info!(command = %command, "migrations finished");
    Ok(())
}
