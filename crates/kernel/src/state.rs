//! Application state shared across all handlers.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::registry::TableRegistry;
use crate::search::SearchService;
use crate::store::{DocumentStore, PgDocumentStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. Built once at startup and
/// read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configured table pairs.
    registry: Arc<TableRegistry>,

    /// Document store; None when it was unreachable at startup.
    store: Option<Arc<dyn DocumentStore>>,

    /// Search service over the registry and store.
    search: SearchService,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Neither an unconfigured nor an unreachable store fails startup. With
    /// no usable `DATABASE_URL` the state has no store at all; an unreachable
    /// server only makes data requests report a server error until it
    /// answers again.
    pub async fn new(config: &Config) -> Self {
        let registry = TableRegistry::new(config.dataset.clone(), config.tables.clone());
        info!(
            dataset = config.dataset.as_deref().unwrap_or("<none>"),
            tables = registry.pairs().len(),
            "table registry loaded"
        );

        let store: Option<Arc<dyn DocumentStore>> = match &config.database_url {
            Some(url) => match db::create_pool(url, config) {
                Ok(pool) => {
                    let store = PgDocumentStore::new(pool, config.query_timeout);
                    if !store.healthy().await {
                        warn!("document store unreachable; will retry on each request");
                    }
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!(error = %e, "running without a document store");
                    None
                }
            },
            None => {
                warn!("DATABASE_URL not set; running without a document store");
                None
            }
        };

        Self::from_parts(registry, store)
    }

    /// Create application state from an existing registry and store.
    pub fn from_parts(registry: TableRegistry, store: Option<Arc<dyn DocumentStore>>) -> Self {
        let registry = Arc::new(registry);
        let search = SearchService::new(registry.clone(), store.clone());
        Self {
            inner: Arc::new(AppStateInner {
                registry,
                store,
                search,
            }),
        }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.inner.registry
    }

    pub fn search(&self) -> &SearchService {
        &self.inner.search
    }

    /// Check whether the document store answers queries.
    pub async fn store_healthy(&self) -> bool {
        match &self.inner.store {
            Some(store) => store.healthy().await,
            None => false,
        }
    }
}
