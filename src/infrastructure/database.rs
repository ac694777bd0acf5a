use crate::infrastructure::config::AppConfig;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, instrument};

pub const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id         TEXT PRIMARY KEY NOT NULL,
        name       TEXT NOT NULL,
        email      TEXT NOT NULL UNIQUE,
        password   TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const FILE_POOL_MAX_CONNECTIONS: u32 = 5;

/// Opens the pool described by `config` and makes sure the schema exists.
#[instrument(skip(config), fields(database_url = %config.database_url, environment = %config.environment))]
pub async fn connect(config: &AppConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid database url: {}", config.database_url))?
        .create_if_missing(true);
    let options = if config.log_sql_statements() {
        options
    } else {
        options.disable_statement_logging()
    };

    let pool = if config.is_in_memory() {
        // Every connection to :memory: is a separate database, so the pool is
        // pinned to one connection that is never recycled.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(FILE_POOL_MAX_CONNECTIONS)
            .connect_with(options)
            .await
    }
    .context("connect to database")?;

    init_schema(&pool).await?;
    info!(in_memory = config.is_in_memory(), "Database ready");
    Ok(pool)
}

/// Ephemeral database with the schema applied.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let config = AppConfig::from_lookup(|key| match key {
        "APP_ENV" => Some("test".to_string()),
        _ => None,
    })?;
    connect(&config).await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    debug!("Synchronising users table");
    sqlx::query(CREATE_USERS_TABLE)
        .execute(pool)
        .await
        .context("create users table")?;
    Ok(())
}
