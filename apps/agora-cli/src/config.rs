//! CLI configuration from environment variables.
//!
//! ```bash
//! DATABASE_URL=sqlite:///var/lib/agora/agora.db   # or AGORA_DATABASE_URL
//! AGORA_MAX_CONNECTIONS=5
//! AGORA_LOG=agora_access=debug,info               # falls back to RUST_LOG
//! ```
//!
//! Without a database URL the store lives in `~/.agora/agora.db`.

use std::env;

use agora_store_sqlite::DEFAULT_MAX_CONNECTIONS;
use thiserror::Error;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgoraConfig {
    /// `None` selects the per-user default database.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid AGORA_MAX_CONNECTIONS: {0}. Expected a positive integer")]
    InvalidMaxConnections(String),

    #[error("Database URL is set but empty")]
    EmptyDatabaseUrl,
}

impl AgoraConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").or_else(|| lookup("AGORA_DATABASE_URL"));
        if database_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        let max_connections = match lookup("AGORA_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidMaxConnections(raw)),
            },
        };

        let log_filter = lookup("AGORA_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            database_url,
            max_connections,
            log_filter,
        })
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, database_url: Option<String>, log: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = Some(url);
        }
        if let Some(filter) = log {
            self.log_filter = filter;
        }
        self
    }
}
