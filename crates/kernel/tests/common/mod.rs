#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests drive the REAL search service and router. Only the document store
//! is replaced: [`MemoryStore`] evaluates each [`QueryPlan`] over in-memory
//! rows with the same semantics the SQL has: LEFT JOIN on the content hash,
//! case-insensitive LIKE with backslash escapes, date casts and NULLS LAST.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Map, Value as JsonValue};
use tower::ServiceExt;

use docsearch_kernel::AppState;
use docsearch_kernel::query::{
    CategoryListing, ColumnRef, Condition, DocumentColumn, KeywordMatch, QueryPlan,
    SortDirection, SummaryColumn, TableRef,
};
use docsearch_kernel::registry::{TablePairConfig, TableRegistry};
use docsearch_kernel::routes;
use docsearch_kernel::search::SearchService;
use docsearch_kernel::store::{DocumentStore, RawRow, StoreError};
use docsearch_test_utils::{test_document, test_summary};

pub const DATASET: &str = "corpus";

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<RawRow>>,
    unavailable: HashSet<String>,
    failing: bool,
    unhealthy: bool,
    plans: Mutex<Vec<QueryPlan>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with its rows.
    pub fn with_table(mut self, table: &str, rows: Vec<RawRow>) -> Self {
        self.tables.insert(key(table), rows);
        self
    }

    /// Make a table fail every access, as a permission error would.
    pub fn with_unavailable(mut self, table: &str) -> Self {
        self.unavailable.insert(key(table));
        self
    }

    /// Make every fetch fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Plans fetched so far.
    pub fn plans(&self) -> Vec<QueryPlan> {
        self.plans.lock().unwrap().clone()
    }

    fn rows(&self, table: &TableRef) -> Result<&[RawRow], StoreError> {
        let name = table.to_string();
        if self.unavailable.contains(&name) {
            return Err(StoreError::TableNotFound(name));
        }
        self.tables
            .get(&name)
            .map(Vec::as_slice)
            .ok_or(StoreError::TableNotFound(name))
    }
}

fn key(table: &str) -> String {
    TableRef::new(Some(DATASET), table).to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn check_table(&self, table: &TableRef) -> Result<(), StoreError> {
        self.rows(table).map(|_| ())
    }

    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<RawRow>, StoreError> {
        self.plans.lock().unwrap().push(plan.clone());
        if self.failing {
            return Err(StoreError::Timeout(Duration::from_secs(30)));
        }

        let documents = self.rows(&plan.from)?;
        let summaries: &[RawRow] = match &plan.join {
            Some(join) => self.rows(&join.table)?,
            None => &[],
        };

        let mut joined: Vec<(&RawRow, Option<&RawRow>)> = documents
            .iter()
            .map(|doc| {
                let summary = plan.join.as_ref().and_then(|_| {
                    summaries
                        .iter()
                        .find(|s| s.get("md5").is_some() && s.get("md5") == doc.get("md5"))
                });
                (doc, summary)
            })
            .filter(|(doc, summary)| {
                plan.conditions
                    .iter()
                    .all(|condition| satisfies(condition, doc, *summary))
            })
            .collect();

        let column = plan.order_by.column.name();
        let descending = plan.order_by.direction == SortDirection::Desc;
        joined.sort_by(|(a, _), (b, _)| {
            compare_nulls_last(text(a, column), text(b, column), descending)
        });

        Ok(joined
            .into_iter()
            .take(plan.limit as usize)
            .map(|(doc, summary)| {
                plan.columns
                    .iter()
                    .map(|projection| {
                        let source = match projection.column {
                            ColumnRef::Document(_) => Some(doc),
                            ColumnRef::Summary(_) => summary,
                        };
                        let value = source
                            .and_then(|row| row.get(projection.column.name()))
                            .cloned()
                            .unwrap_or(JsonValue::Null);
                        (projection.output_name().to_string(), value)
                    })
                    .collect()
            })
            .collect())
    }

    async fn distinct_values(&self, listing: &CategoryListing) -> Result<Vec<String>, StoreError> {
        let rows = self.rows(&listing.table)?;
        let values: BTreeSet<String> = rows
            .iter()
            .filter_map(|row| text(row, listing.column.name()))
            .map(str::to_string)
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn healthy(&self) -> bool {
        !self.unhealthy
    }
}

fn text<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column).and_then(JsonValue::as_str)
}

/// `ORDER BY .. NULLS LAST`.
fn compare_nulls_last(a: Option<&str>, b: Option<&str>, descending: bool) -> std::cmp::Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(a),
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some(_), None) => std::cmp::Ordering::Less,
    }
}

fn satisfies(condition: &Condition, doc: &RawRow, summary: Option<&RawRow>) -> bool {
    match condition {
        Condition::Keywords(matches) => matches.iter().all(|m| keyword_matches(m, doc)),
        Condition::ModifiedOnOrAfter(date) => modified_date(doc).is_some_and(|d| d >= *date),
        Condition::ModifiedOnOrBefore(date) => modified_date(doc).is_some_and(|d| d <= *date),
        Condition::CategoryEquals(value) => {
            text(doc, DocumentColumn::Category.name()) == Some(value.as_str())
        }
        Condition::SubcategoryEquals(value) => summary
            .and_then(|s| text(s, SummaryColumn::Subcategory.name()))
            .is_some_and(|v| v == value),
    }
}

fn keyword_matches(keyword: &KeywordMatch, doc: &RawRow) -> bool {
    keyword.fields.iter().any(|field| {
        text(doc, field.name()).is_some_and(|v| like(&v.to_lowercase(), &keyword.pattern))
    })
}

fn modified_date(doc: &RawRow) -> Option<NaiveDate> {
    let raw = text(doc, DocumentColumn::ModifiedTime.name())?;
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

enum Like {
    Any,
    One,
    Literal(char),
}

/// SQL LIKE with `\` as the escape character.
fn like(value: &str, pattern: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Like::Any,
            '_' => Like::One,
            '\\' => Like::Literal(chars.next().unwrap_or('\\')),
            c => Like::Literal(c),
        });
    }
    let value: Vec<char> = value.chars().collect();
    like_tokens(&value, &tokens)
}

fn like_tokens(value: &[char], tokens: &[Like]) -> bool {
    match tokens.split_first() {
        None => value.is_empty(),
        Some((Like::Any, rest)) => (0..=value.len()).any(|i| like_tokens(&value[i..], rest)),
        Some((Like::One, rest)) => !value.is_empty() && like_tokens(&value[1..], rest),
        Some((Like::Literal(c), rest)) => {
            value.first() == Some(c) && like_tokens(&value[1..], rest)
        }
    }
}

/// Pair `a` joins a summary table, `b` has none, `c` names a summary table
/// the store cannot read, `blank` has no primary table.
pub fn registry() -> TableRegistry {
    TableRegistry::new(
        Some(DATASET.to_string()),
        vec![
            pair("a", "docs_a", Some("sum_a")),
            pair("b", "docs_b", None),
            pair("c", "docs_c", Some("sum_c")),
            pair("blank", "", None),
        ],
    )
}

pub fn pair(id: &str, table: &str, summary: Option<&str>) -> TablePairConfig {
    TablePairConfig {
        id: id.to_string(),
        label: format!("Pair {id}"),
        primary_table: table.to_string(),
        summary_table: summary.map(str::to_string),
    }
}

/// Store holding the standard fixture corpus.
pub fn corpus() -> MemoryStore {
    MemoryStore::new()
        .with_table(
            "docs_a",
            vec![
                test_document("invoice_march.pdf")
                    .with_text("Invoice for March services")
                    .with_category("Finance")
                    .modified("2024-03-05 10:20:30")
                    .row(),
                test_document("invoice_2023.pdf")
                    .with_text("Invoice totals for the year")
                    .with_category("Finance")
                    .modified("2023-12-31 09:00:00")
                    .row(),
                test_document("meeting_notes.docx")
                    .with_text("Notes from the planning meeting")
                    .with_category("Admin")
                    .modified("2024-01-15 14:00:00")
                    .row(),
                test_document("100%_done.txt")
                    .with_text("Progress report: 100% complete")
                    .with_category("Admin")
                    .modified("2022-06-01 08:00:00")
                    .row(),
            ],
        )
        .with_table(
            "sum_a",
            vec![
                test_summary("invoice_march.pdf", "March invoice")
                    .with_subcategory("Billing")
                    .row(),
                test_summary("invoice_2023.pdf", "Annual invoice totals")
                    .with_subcategory("Tax")
                    .row(),
            ],
        )
        .with_table(
            "docs_b",
            vec![
                test_document("contract.pdf")
                    .with_text("Service contract")
                    .with_category("Legal")
                    .modified("2024-02-01 12:00:00")
                    .row(),
                test_document("addendum.pdf")
                    .with_text("Contract addendum")
                    .with_category("Legal")
                    .row(),
            ],
        )
        .with_table(
            "docs_c",
            vec![
                test_document("memo.txt")
                    .with_text("Internal memo")
                    .with_category("Admin")
                    .modified("2024-04-01 09:30:00")
                    .row(),
            ],
        )
        .with_table(
            "sum_c",
            vec![test_summary("memo.txt", "Memo").with_subcategory("Internal").row()],
        )
        .with_unavailable("sum_c")
}

/// Search service over the standard registry and `store`.
pub fn service(store: Arc<MemoryStore>) -> SearchService {
    SearchService::new(Arc::new(registry()), Some(store))
}

/// A router over `registry` and an optional store.
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn new(registry: TableRegistry, store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self::from_state(AppState::from_parts(registry, store))
    }

    /// Router over an already built state.
    pub fn from_state(state: AppState) -> Self {
        Self {
            router: routes::router(state),
        }
    }

    /// Standard registry over the fixture corpus.
    pub fn with_corpus() -> Self {
        Self::new(registry(), Some(Arc::new(corpus())))
    }

    /// Send a request and decode the JSON response body.
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

/// Unwrap a JSON object.
pub fn object(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}
