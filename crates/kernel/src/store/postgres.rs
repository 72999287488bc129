//! PostgreSQL document store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sea_query::{Value, Values};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};
use tracing::debug;

use super::{DocumentStore, RawRow, StoreError};
use crate::query::{
    CategoryListing, QueryPlan, TableRef, render, render_category_listing, render_probe,
};

/// PostgreSQL error code for an undefined table.
const UNDEFINED_TABLE: &str = "42P01";

/// Store backed by a PostgreSQL pool.
///
/// Every call is bounded by the configured timeout, both on the server
/// (`statement_timeout`) and on the client.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn check_table(&self, table: &TableRef) -> Result<(), StoreError> {
        let rendered = render_probe(table);
        let args = arguments(rendered.values)?;

        self.timed(async {
            sqlx::query_with(&rendered.sql, args)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    let missing = matches!(
                        &e,
                        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE)
                    );
                    if missing {
                        StoreError::TableNotFound(table.to_string())
                    } else {
                        StoreError::Database(e)
                    }
                })?;
            Ok(())
        })
        .await
    }

    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<RawRow>, StoreError> {
        let rendered = render(plan);
        debug!(
            sql = %rendered.sql,
            params = rendered.values.0.len(),
            "executing document query"
        );
        let args = arguments(rendered.values)?;
        // No join, filter or aggregate in the outer query, so the planner
        // emits rows in the subquery's ORDER BY order.
        let sql = format!("SELECT row_to_json(t) FROM ({}) t", rendered.sql);

        self.timed(async {
            // SET LOCAL only lasts for this transaction.
            let mut tx = self.pool.begin().await?;
            sqlx::query(&format!(
                "SET LOCAL statement_timeout = '{}ms'",
                self.timeout.as_millis()
            ))
            .execute(&mut *tx)
            .await?;

            let rows: Vec<JsonValue> = sqlx::query_scalar_with(&sql, args)
                .fetch_all(&mut *tx)
                .await?;
            tx.commit().await?;

            rows.into_iter()
                .map(|row| match row {
                    JsonValue::Object(map) => Ok(map),
                    other => Err(StoreError::Decode(format!("expected object, got {other}"))),
                })
                .collect()
        })
        .await
    }

    async fn distinct_values(&self, listing: &CategoryListing) -> Result<Vec<String>, StoreError> {
        let rendered = render_category_listing(listing);
        let args = arguments(rendered.values)?;

        self.timed(async {
            let values: Vec<String> = sqlx::query_scalar_with(&rendered.sql, args)
                .fetch_all(&self.pool)
                .await?;
            Ok(values)
        })
        .await
    }

    async fn healthy(&self) -> bool {
        self.timed(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
        .is_ok()
    }
}

/// Convert rendered values into positional arguments.
fn arguments(values: Values) -> Result<PgArguments, StoreError> {
    let mut args = PgArguments::default();
    for value in values.0 {
        let added = match value {
            Value::String(v) => args.add(v.map(|s| s.to_string())),
            Value::ChronoDate(v) => args.add(v.as_deref().copied()),
            // Postgres has no unsigned integers.
            Value::BigUnsigned(v) => args.add(v.map(|n| i64::try_from(n).unwrap_or(i64::MAX))),
            Value::BigInt(v) => args.add(v),
            Value::Int(v) => args.add(v),
            Value::Bool(v) => args.add(v),
            other => return Err(StoreError::UnsupportedParameter(format!("{other:?}"))),
        };
        added.map_err(|e| StoreError::UnsupportedParameter(e.to_string()))?;
    }
    Ok(args)
}
