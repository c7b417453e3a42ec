use crate::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

/// Connect with backoff — used at process startup so the server survives a
/// database that comes up a few seconds after it. Request-path code never
/// retries anything.
pub async fn create_pool_with_retry(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let strategy = ExponentialBackoff::from_millis(500)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(5);

    Retry::spawn(strategy, || create_pool(config)).await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}
