//! Query plan construction.
//!
//! Builds [`QueryPlan`]s from a [`FilterSet`] and the resolved table pair.
//! Construction is total: every well-typed input yields a plan. User values
//! only ever land in bound parameters; identifiers come from the registry.

use super::types::{
    CategoryListing, ColumnRef, Condition, DATE_OUTPUT, DocumentColumn, FilterSet, KeywordMatch,
    OrderBy, Projection, QueryPlan, SortDirection, SummaryColumn, SummaryJoin, TableRef,
};

/// Tables a plan is built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTables {
    pub primary: TableRef,
    pub summary: Option<TableRef>,
}

impl PlanTables {
    /// The summary table to join, if it is configured and queryable.
    fn join(&self, summary_queryable: bool) -> Option<SummaryJoin> {
        match &self.summary {
            Some(table) if summary_queryable => Some(SummaryJoin {
                table: table.clone(),
            }),
            _ => None,
        }
    }
}

/// Build the search query for `filters`.
///
/// Results are ordered most recently modified first. A subcategory filter is
/// dropped when the summary table is not joined.
pub fn build_search_plan(
    filters: &FilterSet,
    tables: &PlanTables,
    summary_queryable: bool,
) -> QueryPlan {
    let join = tables.join(summary_queryable);
    let mut conditions = Vec::new();

    let keywords = keyword_matches(filters);
    if !keywords.is_empty() {
        conditions.push(Condition::Keywords(keywords));
    }
    if let Some(date) = filters.date_from {
        conditions.push(Condition::ModifiedOnOrAfter(date));
    }
    if let Some(date) = filters.date_to {
        conditions.push(Condition::ModifiedOnOrBefore(date));
    }
    if let Some(category) = non_empty(filters.category.as_deref()) {
        conditions.push(Condition::CategoryEquals(category.to_string()));
    }
    if let Some(subcategory) = non_empty(filters.subcategory.as_deref()) {
        if join.is_some() {
            conditions.push(Condition::SubcategoryEquals(subcategory.to_string()));
        } else {
            tracing::debug!(
                table = %tables.primary,
                "summary table not joined; ignoring subcategory filter"
            );
        }
    }

    QueryPlan {
        columns: projection(join.is_some()),
        from: tables.primary.clone(),
        join,
        conditions,
        order_by: OrderBy {
            column: DocumentColumn::ModifiedTime,
            direction: SortDirection::Desc,
        },
        limit: filters.limit,
    }
}

/// Build the unfiltered document listing, ordered by filename.
pub fn build_listing_plan(tables: &PlanTables, summary_queryable: bool, limit: u64) -> QueryPlan {
    let join = tables.join(summary_queryable);

    QueryPlan {
        columns: projection(join.is_some()),
        from: tables.primary.clone(),
        join,
        conditions: Vec::new(),
        order_by: OrderBy {
            column: DocumentColumn::Filename,
            direction: SortDirection::Asc,
        },
        limit,
    }
}

/// Distinct categories of the primary table.
pub fn category_listing(primary: &TableRef) -> CategoryListing {
    CategoryListing {
        table: primary.clone(),
        column: ColumnRef::Document(DocumentColumn::Category),
    }
}

/// Distinct subcategories of the summary table.
pub fn subcategory_listing(summary: &TableRef) -> CategoryListing {
    CategoryListing {
        table: summary.clone(),
        column: ColumnRef::Summary(SummaryColumn::Subcategory),
    }
}

fn projection(with_summary: bool) -> Vec<Projection> {
    let mut columns: Vec<Projection> = DocumentColumn::PROJECTED
        .iter()
        .map(|&column| Projection {
            column: ColumnRef::Document(column),
            alias: (column == DocumentColumn::ModifiedTime).then_some(DATE_OUTPUT),
        })
        .collect();

    if with_summary {
        columns.extend(
            [SummaryColumn::Summary, SummaryColumn::Subcategory].map(|column| Projection {
                column: ColumnRef::Summary(column),
                alias: None,
            }),
        );
    }

    columns
}

fn keyword_matches(filters: &FilterSet) -> Vec<KeywordMatch> {
    let fields = filters.search_scope.fields();

    filters
        .keyword_tokens()
        .into_iter()
        .enumerate()
        .map(|(i, token)| KeywordMatch {
            param: format!("keyword_{i}"),
            pattern: format!("%{}%", escape_like_wildcards(&token.to_lowercase())),
            fields: fields.to_vec(),
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
pub(crate) fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
