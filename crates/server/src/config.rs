use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a port number, got '{value}'")]
    InvalidPort { var: &'static str, value: String },
}

/// Runtime settings, read from `EIGHTBALL_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_host: String,
    pub database_port: u16,
    pub database_user: String,
    pub database_pass: String,
    pub database_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let port = |key: &'static str, default: &str| {
            let value = var(key, default);
            value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { var: key, value })
        };

        Ok(Self {
            host: var("EIGHTBALL_HOST", "0.0.0.0"),
            port: port("EIGHTBALL_PORT", "8080")?,
            database_host: var("EIGHTBALL_DATABASE_HOST", "pgsql"),
            database_port: port("EIGHTBALL_DATABASE_PORT", "5432")?,
            database_user: var("EIGHTBALL_DATABASE_USER", "postgres"),
            database_pass: var("EIGHTBALL_DATABASE_PASS", "root"),
            database_name: var("EIGHTBALL_DATABASE_DBNAME", "postgres"),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode=disable",
            self.database_user,
            self.database_pass,
            self.database_host,
            self.database_port,
            self.database_name
        )
    }
}
