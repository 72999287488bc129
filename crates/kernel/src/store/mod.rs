//! Document store access.
//!
//! The store owns the document and summary tables; this service only reads
//! from it. [`DocumentStore`] is the seam between the search service and the
//! backing database so the service can run against PostgreSQL in production
//! and against an in-memory store in tests.

mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::query::{CategoryListing, QueryPlan, TableRef};

pub use postgres::PgDocumentStore;

/// A row as returned by the store, keyed by output column name.
pub type RawRow = Map<String, JsonValue>;

/// Errors raised by store calls.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("unsupported parameter value: {0}")]
    UnsupportedParameter(String),

    #[error("unexpected row shape: {0}")]
    Decode(String),
}

/// Read access to the analytical store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Succeeds when `table` exists and can be queried.
    async fn check_table(&self, table: &TableRef) -> Result<(), StoreError>;

    /// Execute a document query and return every row.
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<RawRow>, StoreError>;

    /// Distinct non-null values of a column, ordered ascending.
    async fn distinct_values(&self, listing: &CategoryListing) -> Result<Vec<String>, StoreError>;

    /// Whether the store currently answers queries.
    async fn healthy(&self) -> bool;
}
