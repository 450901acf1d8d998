//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Ledger policy switches.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Event fan-out configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Which store implementation backs the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through SeaORM.
    #[default]
    Postgres,
    /// Process-local store, lost on restart.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Store implementation.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database connection URL. Required for the postgres backend.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger business policy.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LedgerConfig {
    /// Reject repayments on a loan while the borrower holds a newer open loan.
    #[serde(default)]
    pub enforce_latest_loan_first: bool,
}

/// Event fan-out configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NotificationConfig {
    /// Buffered events per subscriber before the slowest one starts lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FUNDLINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Returns the `host:port` socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-defaults")),
                ("FUNDLINE__DATABASE__URL", None::<&str>),
                ("FUNDLINE__DATABASE__BACKEND", None),
                ("FUNDLINE__SERVER__PORT", None),
                ("FUNDLINE__LEDGER__ENFORCE_LATEST_LOAN_FIRST", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.database.backend, StorageBackend::Postgres);
                assert_eq!(config.database.max_connections, 10);
                assert!(!config.ledger.enforce_latest_loan_first);
                assert_eq!(config.notifications.channel_capacity, 64);
                assert_eq!(config.bind_address(), "0.0.0.0:8080");
            },
        );
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-env")),
                ("FUNDLINE__DATABASE__URL", Some("postgres://localhost/fundline")),
                ("FUNDLINE__DATABASE__BACKEND", Some("memory")),
                ("FUNDLINE__SERVER__PORT", Some("9090")),
                ("FUNDLINE__LEDGER__ENFORCE_LATEST_LOAN_FIRST", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.database.url, "postgres://localhost/fundline");
                assert_eq!(config.database.backend, StorageBackend::Memory);
                assert!(config.ledger.enforce_latest_loan_first);
            },
        );
    }
}
