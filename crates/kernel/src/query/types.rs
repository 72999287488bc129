//! Query plan types.
//!
//! A [`QueryPlan`] is the structured description of one statement against a
//! table pair. Plans are produced by the builder, never mutated afterwards,
//! and turned into SQL only by [`super::render`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Default row bound for search requests.
pub const DEFAULT_SEARCH_LIMIT: u64 = 100;

/// Default row bound for document listings.
pub const DEFAULT_LIST_LIMIT: u64 = 500;

/// Alias of the primary table when the summary table is joined.
pub const PRIMARY_ALIAS: &str = "e";

/// Alias of the joined summary table.
pub const SUMMARY_ALIAS: &str = "s";

/// Output name of the modified-time column.
pub const DATE_OUTPUT: &str = "date";

/// Which document fields a keyword is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SearchScope {
    /// Filename or full text.
    #[default]
    #[serde(rename = "All fields")]
    All,
    /// Filename only.
    #[serde(rename = "Filename")]
    FilenameOnly,
    /// Full text only.
    #[serde(rename = "Text")]
    TextOnly,
}

impl SearchScope {
    /// Parse a scope name as sent by clients.
    ///
    /// Accepts the labels used by the search form as well as snake-case
    /// names. Unknown names are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all fields" | "all" => Some(Self::All),
            "filename" | "filename_only" => Some(Self::FilenameOnly),
            "text" | "text_only" => Some(Self::TextOnly),
            _ => None,
        }
    }

    /// Fields checked for every keyword token.
    pub fn fields(self) -> &'static [DocumentColumn] {
        match self {
            Self::All => &[DocumentColumn::Filename, DocumentColumn::Text],
            Self::FilenameOnly => &[DocumentColumn::Filename],
            Self::TextOnly => &[DocumentColumn::Text],
        }
    }
}

impl<'de> Deserialize<'de> for SearchScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::unknown_variant(&raw, &["All fields", "Filename", "Text"])
        })
    }
}

/// Search filters supplied with one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterSet {
    /// Whitespace-separated keywords.
    #[serde(rename = "query", default)]
    pub keyword: Option<String>,

    #[serde(rename = "search_type", default)]
    pub search_scope: SearchScope,

    /// Inclusive lower bound on the modified date.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on the modified date.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    #[serde(rename = "category_filter", default)]
    pub category: Option<String>,

    /// Only honoured when the summary table is joined.
    #[serde(rename = "subcategory_filter", default)]
    pub subcategory: Option<String>,

    /// Selected table pair; unknown ids fall back to the first pair.
    #[serde(default)]
    pub table_id: Option<String>,

    #[serde(default = "default_search_limit")]
    pub limit: u64,

    /// Display hint for clients. Summaries are joined whenever available.
    #[serde(rename = "show_summaries", default)]
    pub include_summaries: bool,
}

fn default_search_limit() -> u64 {
    DEFAULT_SEARCH_LIMIT
}

impl FilterSet {
    /// Filters with no predicates and the default limit.
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            ..Default::default()
        }
    }

    /// Keyword tokens, split on whitespace.
    pub fn keyword_tokens(&self) -> Vec<&str> {
        self.keyword
            .as_deref()
            .map(|k| k.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// A trusted table identifier taken from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Schema qualifying the table, when configured.
    pub dataset: Option<String>,
    pub table: String,
}

impl TableRef {
    pub fn new(dataset: Option<&str>, table: &str) -> Self {
        Self {
            dataset: dataset.map(str::to_string),
            table: table.to_string(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dataset {
            Some(dataset) => write!(f, "{dataset}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

/// Columns of the primary document table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentColumn {
    ContentHash,
    Text,
    Snippet,
    Filename,
    Category,
    SizeHuman,
    PageCount,
    Path,
    ModifiedTime,
}

impl DocumentColumn {
    /// Projection order for every document query.
    pub const PROJECTED: [DocumentColumn; 9] = [
        Self::ContentHash,
        Self::Text,
        Self::Snippet,
        Self::Filename,
        Self::Category,
        Self::SizeHuman,
        Self::PageCount,
        Self::Path,
        Self::ModifiedTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ContentHash => "md5",
            Self::Text => "text",
            Self::Snippet => "snippet",
            Self::Filename => "filename",
            Self::Category => "category",
            Self::SizeHuman => "size_human",
            Self::PageCount => "page_count",
            Self::Path => "path",
            Self::ModifiedTime => "mtime",
        }
    }
}

/// Columns of the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryColumn {
    ContentHash,
    Summary,
    Subcategory,
}

impl SummaryColumn {
    pub fn name(self) -> &'static str {
        match self {
            Self::ContentHash => "md5",
            Self::Summary => "summary",
            Self::Subcategory => "subcategory",
        }
    }
}

/// A column of either table in a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Document(DocumentColumn),
    Summary(SummaryColumn),
}

impl ColumnRef {
    pub fn name(self) -> &'static str {
        match self {
            Self::Document(c) => c.name(),
            Self::Summary(c) => c.name(),
        }
    }

    pub fn is_summary(self) -> bool {
        matches!(self, Self::Summary(_))
    }
}

/// One entry of the SELECT list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub column: ColumnRef,
    pub alias: Option<&'static str>,
}

impl Projection {
    /// Name of the column in result rows.
    pub fn output_name(&self) -> &'static str {
        self.alias.unwrap_or_else(|| self.column.name())
    }
}

/// LEFT JOIN of the summary table on the content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryJoin {
    pub table: TableRef,
}

/// One keyword token matched against a set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    /// Bound parameter name, unique per token.
    pub param: String,
    /// Lower-cased, LIKE-escaped `%token%` pattern.
    pub pattern: String,
    /// Fields OR-combined for this token.
    pub fields: Vec<DocumentColumn>,
}

/// A single WHERE predicate. All predicates are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Every token must match at least one of its fields.
    Keywords(Vec<KeywordMatch>),
    ModifiedOnOrAfter(NaiveDate),
    ModifiedOnOrBefore(NaiveDate),
    CategoryEquals(String),
    /// Only present in plans that join the summary table.
    SubcategoryEquals(String),
}

impl Condition {
    /// Whether this predicate reads the summary table.
    pub fn references_summary(&self) -> bool {
        matches!(self, Self::SubcategoryEquals(_))
    }
}

/// A named parameter value.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: ParamValue,
}

#[cfg(test)]
impl Binding {
    fn new(name: &str, value: ParamValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Bound parameter values.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Date(NaiveDate),
    Integer(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: DocumentColumn,
    pub direction: SortDirection,
}

/// A complete, executable description of one document query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub columns: Vec<Projection>,
    pub from: TableRef,
    pub join: Option<SummaryJoin>,
    pub conditions: Vec<Condition>,
    pub order_by: OrderBy,
    /// Always bound as a parameter.
    pub limit: u64,
}

impl QueryPlan {
    pub fn uses_join(&self) -> bool {
        self.join.is_some()
    }
}

/// Named parameter model of a plan, checked against the rendered values.
#[cfg(test)]
impl Condition {
    /// Parameters bound by this predicate, in placeholder order.
    pub fn bindings(&self) -> Vec<Binding> {
        match self {
            Self::Keywords(matches) => matches
                .iter()
                .flat_map(|m| {
                    m.fields.iter().map(|_| Binding {
                        name: m.param.clone(),
                        value: ParamValue::Text(m.pattern.clone()),
                    })
                })
                .collect(),
            Self::ModifiedOnOrAfter(date) => vec![Binding::new("date_from", ParamValue::Date(*date))],
            Self::ModifiedOnOrBefore(date) => vec![Binding::new("date_to", ParamValue::Date(*date))],
            Self::CategoryEquals(value) => {
                vec![Binding::new("category", ParamValue::Text(value.clone()))]
            }
            Self::SubcategoryEquals(value) => {
                vec![Binding::new("subcategory", ParamValue::Text(value.clone()))]
            }
        }
    }
}

#[cfg(test)]
impl QueryPlan {
    /// Every bound parameter in placeholder order, ending with the limit.
    pub fn bindings(&self) -> Vec<Binding> {
        let mut bindings: Vec<Binding> =
            self.conditions.iter().flat_map(Condition::bindings).collect();
        bindings.push(Binding::new("limit", ParamValue::Integer(self.limit)));
        bindings
    }

    /// Distinct parameter names in first-use order.
    pub fn param_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for binding in self.bindings() {
            if !names.contains(&binding.name) {
                names.push(binding.name);
            }
        }
        names
    }
}

/// Distinct, non-null values of one column, ordered ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListing {
    pub table: TableRef,
    pub column: ColumnRef,
}
