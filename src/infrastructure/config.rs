use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://database.sqlite";
pub const IN_MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Test,
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("unknown APP_ENV value: {other}"),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Test => "test",
            Environment::Development => "development",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid PORT value: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let environment = match lookup("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => Environment::Development,
        };
        let database_url = match environment {
            Environment::Test => IN_MEMORY_DATABASE_URL.to_string(),
            _ => lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        };

        Ok(Self {
            host,
            port,
            environment,
            database_url,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE_URL
    }

    pub fn log_sql_statements(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
