//! Database connection pool management.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Create a PostgreSQL connection pool.
///
/// Connections are opened on first use, so an unreachable server does not
/// fail here; every later acquire retries until the server answers. Only a
/// malformed URL is an error.
pub fn create_pool(database_url: &str, config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.query_timeout)
        .connect_lazy(database_url)
        .context("invalid DATABASE_URL")?;

    Ok(pool)
}
