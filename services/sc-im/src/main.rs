//! sc-im Service - Stock & Inventory Management

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use tracing::{error, info};

use adapter_postgres::{check_connection, create_pool, MigrationManager, PostgresConfig};
use config::AppConfig;
use sc_im::application::ServiceHandler;
use sc_im::infrastructure::persistence::{
    migrations, PostgresStockQueryRepository, PostgresStockUnitOfWorkFactory,
};
use telemetry::{init_metrics, init_tracing, init_tracing_json, HealthStatus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;

    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }
    let _metrics_handle = init_metrics();

    info!("Starting {} ({})", config.app_name, config.app_env);

    let pg_config = PostgresConfig::new(config.database.url.expose_secret())
        .with_max_connections(config.database.max_connections);
    let pool = create_pool(&pg_config).await?;

    let mut health = HealthStatus::new();

    let db_check = check_connection(&pool).await;
    health.add_check("database", db_check.is_ok(), db_check.err().map(|e| e.to_string()));

    let migration_result = MigrationManager::new(pool.clone())
        .with_table_name("_sc_im_migrations")
        .migrate(&migrations())
        .await?;
    for failure in &migration_result.errors {
        error!(
            "Migration {} ({}) failed: {}",
            failure.version, failure.name, failure.error
        );
    }
    health.add_check(
        "migrations",
        migration_result.is_success(),
        (!migration_result.is_success())
            .then(|| format!("{} migration(s) failed", migration_result.errors.len())),
    );

    if !health.healthy() {
        error!("Startup checks failed: {:?}", health.failed_checks());
        return Err("startup health checks failed".into());
    }
    info!(
        "Startup checks passed, migrations up to date ({} applied, {} skipped)",
        migration_result.applied.len(),
        migration_result.skipped.len()
    );

    let uow_factory = Arc::new(PostgresStockUnitOfWorkFactory::new(pool.clone()));
    let query_repo = Arc::new(PostgresStockQueryRepository::new(pool));
    let handler = Arc::new(ServiceHandler::new(uow_factory, query_repo));
    info!("Service handler initialized");

    let sweep_interval = Duration::from_secs(config.inventory.reservation_sweep_interval_secs);
    let sweep_batch_size = config.inventory.reservation_sweep_batch_size;
    let mut ticker = tokio::time::interval(sweep_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        "Reservation sweeper running every {}s (batch size {})",
        sweep_interval.as_secs(),
        sweep_batch_size
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = handler.release_expired_reservations(sweep_batch_size).await {
                    error!("Reservation sweep failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping");
                break;
            }
        }
    }

    Ok(())
}
