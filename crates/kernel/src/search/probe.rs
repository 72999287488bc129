//! Summary table availability check.

use tracing::debug;

use crate::query::TableRef;
use crate::store::DocumentStore;

/// Whether `table` can be queried right now.
///
/// Every failure (missing table, permissions, connectivity, timeout) is
/// reported as `false`; callers proceed as if the table did not exist.
/// The answer is not cached: the store's schema changes independently of
/// this service.
pub async fn summary_available(store: &dyn DocumentStore, table: &TableRef) -> bool {
    match store.check_table(table).await {
        Ok(()) => true,
        Err(e) => {
            debug!(table = %table, error = %e, "summary table unavailable");
            false
        }
    }
}
