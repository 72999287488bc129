//! Plan rendering using SeaQuery.
//!
//! This is the only place where statement text is produced. Identifiers are
//! taken from the plan (registry-derived) and quoted by SeaQuery; every value
//! is emitted as a `$n` placeholder with the value returned alongside.

use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, Func, IntoColumnRef, IntoTableRef, JoinType,
    NullOrdering, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr, Values,
};

use super::types::{
    CategoryListing, ColumnRef, Condition, DocumentColumn, KeywordMatch, PRIMARY_ALIAS,
    QueryPlan, SUMMARY_ALIAS, SortDirection, SummaryColumn, TableRef,
};

/// Statement text with its positional parameter values.
#[derive(Debug, Clone)]
pub struct RenderedQuery {
    pub sql: String,
    pub values: Values,
}

/// Render a document query.
pub fn render(plan: &QueryPlan) -> RenderedQuery {
    let columns = ColumnQualifier {
        joined: plan.uses_join(),
    };
    let mut query = Query::select();

    for projection in &plan.columns {
        let col = columns.column(projection.column);
        match projection.alias {
            Some(alias) => {
                query.expr_as(Expr::col(col), Alias::new(alias));
            }
            None => {
                query.column(col);
            }
        }
    }

    match &plan.join {
        Some(join) => {
            query.from_as(table_ref(&plan.from), Alias::new(PRIMARY_ALIAS));
            query.join_as(
                JoinType::LeftJoin,
                table_ref(&join.table),
                Alias::new(SUMMARY_ALIAS),
                Expr::col(columns.column(ColumnRef::Document(DocumentColumn::ContentHash)))
                    .equals(columns.column(ColumnRef::Summary(SummaryColumn::ContentHash))),
            );
        }
        None => {
            query.from(table_ref(&plan.from));
        }
    }

    if !plan.conditions.is_empty() {
        let mut cond = Cond::all();
        for condition in &plan.conditions {
            cond = cond.add(columns.condition(condition));
        }
        query.cond_where(cond);
    }

    let order = match plan.order_by.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    // Rows without a value sort last in either direction.
    query.order_by_with_nulls(
        columns.column(ColumnRef::Document(plan.order_by.column)),
        order,
        NullOrdering::Last,
    );
    query.limit(plan.limit);

    build(&query)
}

/// Render the cheapest statement that fails when `table` is not queryable.
pub fn render_probe(table: &TableRef) -> RenderedQuery {
    let mut query = Query::select();
    query.column(Asterisk).from(table_ref(table)).limit(0);
    build(&query)
}

/// Render a distinct-values listing.
pub fn render_category_listing(listing: &CategoryListing) -> RenderedQuery {
    let column = Alias::new(listing.column.name());
    let mut query = Query::select();
    query
        .distinct()
        .column(column.clone())
        .from(table_ref(&listing.table))
        .and_where(Expr::col(column.clone()).is_not_null())
        .order_by(column, Order::Asc);
    build(&query)
}

fn build(query: &SelectStatement) -> RenderedQuery {
    let (sql, values) = query.build(PostgresQueryBuilder);
    RenderedQuery { sql, values }
}

fn table_ref(table: &TableRef) -> sea_query::TableRef {
    match &table.dataset {
        Some(dataset) => (Alias::new(dataset), Alias::new(&table.table)).into_table_ref(),
        None => Alias::new(&table.table).into_table_ref(),
    }
}

/// Column references for one plan.
///
/// Columns are qualified with the table alias exactly when the summary
/// table is joined.
struct ColumnQualifier {
    joined: bool,
}

impl ColumnQualifier {
    fn column(&self, column: ColumnRef) -> sea_query::ColumnRef {
        let name = Alias::new(column.name());
        if !self.joined {
            return name.into_column_ref();
        }
        let alias = if column.is_summary() {
            SUMMARY_ALIAS
        } else {
            PRIMARY_ALIAS
        };
        (Alias::new(alias), name).into_column_ref()
    }

    fn document(&self, column: DocumentColumn) -> sea_query::ColumnRef {
        self.column(ColumnRef::Document(column))
    }

    fn condition(&self, condition: &Condition) -> Cond {
        match condition {
            Condition::Keywords(matches) => matches
                .iter()
                .fold(Cond::all(), |all, m| all.add(self.keyword(m))),
            Condition::ModifiedOnOrAfter(date) => {
                Cond::all().add(self.modified_date().gte(*date))
            }
            Condition::ModifiedOnOrBefore(date) => {
                Cond::all().add(self.modified_date().lte(*date))
            }
            Condition::CategoryEquals(value) => Cond::all()
                .add(Expr::col(self.document(DocumentColumn::Category)).eq(value.as_str())),
            Condition::SubcategoryEquals(value) => Cond::all().add(
                Expr::col(self.column(ColumnRef::Summary(SummaryColumn::Subcategory)))
                    .eq(value.as_str()),
            ),
        }
    }

    /// `LOWER(field) LIKE pattern` for each field, OR-combined.
    fn keyword(&self, keyword: &KeywordMatch) -> Cond {
        keyword.fields.iter().fold(Cond::any(), |any, &field| {
            any.add(
                Expr::expr(Func::lower(Expr::col(self.document(field))))
                    .like(keyword.pattern.clone()),
            )
        })
    }

    fn modified_date(&self) -> SimpleExpr {
        Func::cast_as(
            Expr::col(self.document(DocumentColumn::ModifiedTime)),
            Alias::new("date"),
        )
        .into()
    }
}
