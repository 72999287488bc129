//! Document Search Kernel Library
//!
//! Exposes the search service and HTTP routes for the `docsearch` binary
//! and for integration testing.

pub mod config;
pub mod db;
pub mod error;
pub mod normalize;
pub mod query;
pub mod registry;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;
