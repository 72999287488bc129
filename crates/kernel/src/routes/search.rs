//! Search route handler.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::normalize::ResultRow;
use crate::query::FilterSet;
use crate::state::AppState;

/// Create the search router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/search", post(search))
}

/// JSON search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ResultRow>,
}

/// Search documents with the filters in the request body.
async fn search(
    State(state): State<AppState>,
    payload: Result<Json<FilterSet>, JsonRejection>,
) -> AppResult<Json<SearchResponse>> {
    let Json(filters) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if filters.limit == 0 {
        return Err(AppError::BadRequest(
            "limit must be a positive integer".to_string(),
        ));
    }

    let results = state.search().search(&filters).await?;
    tracing::debug!(count = results.len(), "search complete");

    Ok(Json(SearchResponse { results }))
}
