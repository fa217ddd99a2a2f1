//! # Database Persistence Layer
//!
//! Optional Postgres persistence for case records via SQLx.
//!
//! When a database URL is configured, every case mutation is written to
//! the `cases` table before it is committed in memory, and the in-memory
//! store is hydrated from the table on startup. When absent, the API runs
//! in-memory only (development and tests).

pub mod cases;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to Postgres and run the embedded migrations.
///
/// Returns `None` when `url` is `None` (in-memory only mode).
pub async fn init_pool(url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. Cases will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}

/// Cheap connectivity probe for the readiness endpoint.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
