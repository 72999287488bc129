//! Document query construction.
//!
//! This module provides:
//! - Types: FilterSet, QueryPlan, Condition, TableRef, etc.
//! - Builder: pure construction of plans from filters and a table pair
//! - Render: SeaQuery-based, parameterized SQL generation

pub mod builder;
pub mod render;
pub mod types;

pub use builder::{
    PlanTables, build_listing_plan, build_search_plan, category_listing, subcategory_listing,
};
pub use render::{RenderedQuery, render, render_category_listing, render_probe};
pub use types::{
    CategoryListing, ColumnRef, Condition, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT,
    DocumentColumn, FilterSet, KeywordMatch, OrderBy, Projection, QueryPlan,
    SearchScope, SortDirection, SummaryColumn, SummaryJoin, TableRef,
};
