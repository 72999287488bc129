//! Table pair registry.
//!
//! Holds the configured table pairs (a primary document table plus an
//! optional summary table) and resolves a request's selection. The registry
//! is built once at startup and is read-only afterwards.

use serde::{Deserialize, Deserializer, Serialize};

use crate::query::TableRef;

/// One configured table pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePairConfig {
    pub id: String,
    pub label: String,
    /// Primary document table.
    #[serde(rename = "table")]
    pub primary_table: String,
    /// Summary table joined on the content hash.
    #[serde(rename = "summary", default, deserialize_with = "blank_as_none")]
    pub summary_table: Option<String>,
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Tables selected for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTables {
    pub primary: Option<TableRef>,
    pub summary: Option<TableRef>,
}

/// Ordered collection of table pairs.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    dataset: Option<String>,
    pairs: Vec<TablePairConfig>,
}

impl TableRegistry {
    /// Create a registry. `dataset` qualifies every table name.
    pub fn new(dataset: Option<String>, pairs: Vec<TablePairConfig>) -> Self {
        Self { dataset, pairs }
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    pub fn pairs(&self) -> &[TablePairConfig] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Resolve a selection to its tables.
    ///
    /// A matching id selects that pair; no id or an unknown id selects the
    /// first pair. An empty registry resolves to no tables.
    pub fn resolve(&self, id: Option<&str>) -> ResolvedTables {
        let selected = id
            .and_then(|id| self.pairs.iter().find(|pair| pair.id == id))
            .or_else(|| self.pairs.first());

        let Some(pair) = selected else {
            return ResolvedTables::default();
        };

        let dataset = self.dataset.as_deref();
        ResolvedTables {
            primary: Some(pair.primary_table.as_str())
                .filter(|t| !t.trim().is_empty())
                .map(|t| TableRef::new(dataset, t)),
            summary: pair
                .summary_table
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(|t| TableRef::new(dataset, t)),
        }
    }
}
