//! Document listing route handler.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::normalize::ResultRow;
use crate::query::DEFAULT_LIST_LIMIT;
use crate::state::AppState;

/// Create the documents router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/documents", get(list_documents))
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Selected table pair.
    pub table_id: Option<String>,
    /// Maximum number of documents.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIST_LIMIT
}

/// JSON listing response.
#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<ResultRow>,
}

/// List documents ordered by filename.
async fn list_documents(
    State(state): State<AppState>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<DocumentsResponse>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if params.limit == 0 {
        return Err(AppError::BadRequest(
            "limit must be a positive integer".to_string(),
        ));
    }

    let documents = state
        .search()
        .list(params.table_id.as_deref(), params.limit)
        .await?;

    Ok(Json(DocumentsResponse { documents }))
}
