//! HTTP route handlers.

pub mod catalog;
pub mod documents;
pub mod health;
pub mod search;

use axum::Router;

use crate::state::AppState;

/// Create the application router with every route attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(search::router())
        .merge(documents::router())
        .merge(catalog::router())
        .merge(health::router())
        .with_state(state)
}
