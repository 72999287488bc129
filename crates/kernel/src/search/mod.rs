//! Document search service.
//!
//! Runs one request end to end: resolve the table pair, probe the summary
//! table, build the plan, execute it and normalize the rows.

pub mod probe;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::normalize::{ResultRow, normalize};
use crate::query::{
    FilterSet, PlanTables, QueryPlan, build_listing_plan, build_search_plan, category_listing,
    subcategory_listing,
};
use crate::registry::{ResolvedTables, TableRegistry};
use crate::store::{DocumentStore, StoreError};

pub use probe::summary_available;

/// Errors from search and listing requests.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The service started without a reachable store.
    #[error("document store is not initialized")]
    StoreUnavailable,

    /// The selected table pair has no primary table.
    #[error("no table configured")]
    NoTable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Distinct category values for the filter menus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
}

/// Search service over the configured table pairs.
#[derive(Clone)]
pub struct SearchService {
    registry: Arc<TableRegistry>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl SearchService {
    /// Create a search service. A `None` store runs the service degraded:
    /// every data request fails until the process is restarted with a
    /// reachable store.
    pub fn new(registry: Arc<TableRegistry>, store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn store_available(&self) -> bool {
        self.store.is_some()
    }

    /// Search documents matching `filters`, most recently modified first.
    pub async fn search(&self, filters: &FilterSet) -> Result<Vec<ResultRow>, SearchError> {
        if self.registry.is_empty() {
            debug!("no table pairs configured; returning no results");
            return Ok(Vec::new());
        }
        let store = self.store()?;
        let tables = self.plan_tables(filters.table_id.as_deref())?;
        let summary_queryable = self.probe(store, &tables).await;

        let plan = build_search_plan(filters, &tables, summary_queryable);
        debug!(
            table = %plan.from,
            joined = plan.uses_join(),
            predicates = plan.conditions.len(),
            limit = plan.limit,
            "searching documents"
        );
        execute(store, &plan).await
    }

    /// List documents ordered by filename.
    pub async fn list(
        &self,
        table_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<ResultRow>, SearchError> {
        if self.registry.is_empty() {
            debug!("no table pairs configured; returning no documents");
            return Ok(Vec::new());
        }
        let store = self.store()?;
        let tables = self.plan_tables(table_id)?;
        let summary_queryable = self.probe(store, &tables).await;

        let plan = build_listing_plan(&tables, summary_queryable, limit);
        debug!(table = %plan.from, joined = plan.uses_join(), limit, "listing documents");
        execute(store, &plan).await
    }

    /// Category and subcategory values for the selected pair.
    ///
    /// Never fails: any missing configuration or store error yields empty
    /// lists. Subcategories come from the summary table and are dropped on
    /// their own if that lookup fails.
    pub async fn categories(&self, table_id: Option<&str>) -> Categories {
        let ResolvedTables { primary, summary } = self.registry.resolve(table_id);
        let (Some(primary), Some(store)) = (primary, self.store.as_deref()) else {
            return Categories::default();
        };

        let categories = match store.distinct_values(&category_listing(&primary)).await {
            Ok(values) => values,
            Err(e) => {
                warn!(table = %primary, error = %e, "failed to fetch categories");
                return Categories::default();
            }
        };

        let subcategories = match summary {
            Some(summary) => store
                .distinct_values(&subcategory_listing(&summary))
                .await
                .unwrap_or_else(|e| {
                    debug!(table = %summary, error = %e, "no subcategories available");
                    Vec::new()
                }),
            None => Vec::new(),
        };

        Categories {
            categories,
            subcategories,
        }
    }

    fn store(&self) -> Result<&dyn DocumentStore, SearchError> {
        self.store.as_deref().ok_or(SearchError::StoreUnavailable)
    }

    fn plan_tables(&self, table_id: Option<&str>) -> Result<PlanTables, SearchError> {
        let ResolvedTables { primary, summary } = self.registry.resolve(table_id);
        let primary = primary.ok_or(SearchError::NoTable)?;
        Ok(PlanTables { primary, summary })
    }

    async fn probe(&self, store: &dyn DocumentStore, tables: &PlanTables) -> bool {
        match &tables.summary {
            Some(summary) => summary_available(store, summary).await,
            None => false,
        }
    }
}

async fn execute(
    store: &dyn DocumentStore,
    plan: &QueryPlan,
) -> Result<Vec<ResultRow>, SearchError> {
    let rows = store.fetch(plan).await?;
    let limit = usize::try_from(plan.limit).unwrap_or(usize::MAX);
    Ok(rows.into_iter().take(limit).map(normalize).collect())
}
