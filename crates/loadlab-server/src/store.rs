//! Read-only catalog store.
//!
//! The service only ever asks the relational store two introspection
//! questions. They sit behind [`CatalogStore`] so the stats handler and the
//! sampler can be exercised against fakes; production uses [`PgCatalog`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::time::Instant;

use loadlab_core::error::{LoadLabError, Result};

use crate::config::DatabaseSection;

const TABLE_COUNT_SQL: &str = "SELECT COUNT(*) FROM information_schema.tables";
const TOTAL_SIZE_SQL: &str =
    "SELECT COALESCE(SUM(pg_database_size(datname)), 0)::BIGINT FROM pg_database";

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Approximate row count: number of tables visible in the catalog.
    async fn table_count(&self) -> Result<i64>;
    /// Aggregate on-disk size of every database, in bytes.
    async fn total_size_bytes(&self) -> Result<i64>;
}

/// Postgres-backed catalog.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Build the pool without dialing the server. Fails only on an unusable URL;
    /// an unreachable server surfaces later as per-query errors.
    pub fn connect_lazy(cfg: &DatabaseSection) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout())
            .connect_lazy(&cfg.url)
            .map_err(|e| LoadLabError::Config(format!("database pool: {e}")))?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn table_count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(TABLE_COUNT_SQL)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LoadLabError::Store(format!("table count: {e}")))
    }

    async fn total_size_bytes(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(TOTAL_SIZE_SQL)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LoadLabError::Store(format!("database size: {e}")))
    }
}

/// Run `fut` with a `budget` timeout.
pub async fn within<T, F>(budget: Duration, op: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    until(Instant::now() + budget, op, fut).await
}

/// Run `fut` until `deadline`; several calls may share one deadline.
pub async fn until<T, F>(deadline: Instant, op: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(r) => r,
        Err(_) => Err(LoadLabError::Timeout(op.to_string())),
    }
}
