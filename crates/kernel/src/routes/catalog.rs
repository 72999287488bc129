//! Configuration and category metadata for clients.
//!
//! Both endpoints always answer; missing configuration or an unreachable
//! store yields empty values.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::registry::TablePairConfig;
use crate::search::Categories;
use crate::state::AppState;

/// Create the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/categories", get(get_categories))
}

/// Dataset configuration for display.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub dataset: Option<String>,
    pub tables: Vec<TablePairConfig>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub table_id: Option<String>,
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let registry = state.registry();
    Json(ConfigResponse {
        dataset: registry.dataset().map(str::to_string),
        tables: registry.pairs().to_vec(),
    })
}

async fn get_categories(
    State(state): State<AppState>,
    Query(params): Query<CategoriesQuery>,
) -> Json<Categories> {
    Json(state.search().categories(params.table_id.as_deref()).await)
}
