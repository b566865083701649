use metrics::{counter, gauge};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;

/// Pool sizing and timeouts for the CRM store
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    /// Connections idle longer than this are closed
    pub idle_timeout: Duration,
    /// How long a job waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(app: &AppConfig) -> Self {
        Self {
            url: app.database_url.clone(),
            max_connections: app.db_max_connections,
            min_connections: app.db_min_connections,
            connect_timeout: Duration::from_secs(app.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(app.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(app.db_acquire_timeout_secs),
        }
    }
}

/// Open a pool with the given settings
pub async fn establish_connection_with_config(
    settings: &DbConfig,
) -> Result<DatabaseConnection, ServiceError> {
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .connect_timeout(settings.connect_timeout)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .sqlx_logging(false);

    gauge!("bi_crm_db.max_connections", settings.max_connections as f64);
    debug!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "opening CRM store pool"
    );

    match Database::connect(options).await {
        Ok(pool) => {
            info!(max_connections = settings.max_connections, "CRM store pool ready");
            Ok(pool)
        }
        Err(e) => {
            counter!("bi_crm_db.connection_failures", 1);
            error!(error = %e, "could not open CRM store pool");
            Err(ServiceError::DatabaseError(e))
        }
    }
}

pub async fn establish_connection_from_app_config(
    app: &AppConfig,
) -> Result<DatabaseConnection, ServiceError> {
    establish_connection_with_config(&DbConfig::from(app)).await
}

/// Bring the schema up to date. Already applied migrations are skipped.
pub async fn run_migrations(pool: &DatabaseConnection) -> Result<(), ServiceError> {
    let started = Instant::now();
    Migrator::up(pool, None).await.map_err(|e| {
        error!(error = %e, elapsed = ?started.elapsed(), "schema migration failed");
        ServiceError::DatabaseError(e)
    })?;
    info!(elapsed = ?started.elapsed(), "schema is up to date");
    Ok(())
}

/// Ping the store and record the round trip
pub async fn check_connection(pool: &DatabaseConnection) -> Result<(), ServiceError> {
    let started = Instant::now();
    if let Err(e) = pool.ping().await {
        counter!("bi_crm_db.connection_failures", 1);
        error!(error = %e, "CRM store ping failed");
        return Err(ServiceError::DatabaseError(e));
    }
    gauge!(
        "bi_crm_db.ping_latency_ms",
        started.elapsed().as_secs_f64() * 1_000.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_settings_follow_app_config() {
        let mut app = AppConfig::new("sqlite::memory:".into(), "test".into());
        app.db_max_connections = 3;
        app.db_acquire_timeout_secs = 2;

        let settings = DbConfig::from(&app);
        assert_eq!(settings.url, "sqlite::memory:");
        assert_eq!(settings.max_connections, 3);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn migrating_twice_is_harmless() {
        let settings = DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        };
        let pool = establish_connection_with_config(&settings).await.unwrap();
        check_connection(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }
}
