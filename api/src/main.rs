use std::sync::Arc;

use anyhow::Context;
use ledger_api::app_state::AppState;
use ledger_api::config::load_config;
use ledger_api::http;
use ledger_api::infra::postgres;
use ledger_api::repository::TransactionRepository;
use ledger_api::telemetry::init_telemetry;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if exists
    let _ = dotenvy::dotenv();

    let config = load_config().context("Failed to load configuration")?;

    init_telemetry(&config.telemetry).context("Failed to initialize logging")?;

    tracing::info!(
        environment = %config.service.environment,
        port = %config.server.port,
        "Initializing ledger API"
    );

    let pg_pool = postgres::init_postgres(&config.database)
        .context("Failed to configure PostgreSQL connection pool")?;

    // Reachability is reported but never fatal: /health must answer regardless
    {
        let pool = pg_pool.clone();
        tokio::spawn(async move {
            match postgres::check_postgres_health(&pool).await {
                Ok(()) => tracing::info!("PostgreSQL reachable"),
                Err(e) => tracing::warn!(error = %e, "PostgreSQL not reachable at startup"),
            }
        });
    }

    let repository = TransactionRepository::new(pg_pool.clone(), config.database.table.clone());
    let app_state = AppState::new(
        config.service.environment.clone(),
        config.server.port,
        Arc::new(repository),
    );

    let server = http::start_server(config, app_state);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
                pg_pool.close().await;
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Closing PostgreSQL connection pool");
    pg_pool.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
