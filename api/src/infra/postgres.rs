//! PostgreSQL integration

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    // `require` encrypts without validating the server certificate
    let ssl_mode = PgSslMode::from_str(&config.ssl_mode)?;

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .ssl_mode(ssl_mode);

    if !config.name.is_empty() {
        options = options.database(&config.name);
    }
    if !config.user.is_empty() {
        options = options.username(&config.user);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }

    Ok(options)
}

/// Builds the shared pool without opening a connection, so the process starts
/// (and `/health` answers) while the database is unreachable.
pub fn init_postgres(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        host = %config.host,
        port = %config.port,
        database = %config.name,
        table = %config.table,
        ssl_mode = %config.ssl_mode,
        max_connections = %config.max_connections,
        acquire_timeout_ms = %config.acquire_timeout_ms,
        idle_timeout_ms = %config.idle_timeout_ms,
        "Initializing PostgreSQL connection pool"
    );

    let options = connect_options(config)?;

    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .idle_timeout(Duration::from_millis(config.idle_timeout_ms))
        .connect_lazy_with(options))
}

pub async fn check_postgres_health(pool: &PgPool) -> Result<(), String> {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("PostgreSQL health check failed: {}", e)),
    }
}
