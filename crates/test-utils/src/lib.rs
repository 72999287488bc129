//! Document search test utilities.
//!
//! Fixture builders for document and summary rows, plus assertion helpers
//! for JSON responses.

use serde_json::{Map, Value as JsonValue, json};

/// Create a test document with default values.
///
/// The content hash is derived from the filename so summaries can be
/// attached with [`test_summary`] without tracking hashes by hand.
pub fn test_document(filename: &str) -> TestDocument {
    TestDocument {
        md5: hash_for(filename),
        text: String::new(),
        snippet: None,
        filename: filename.to_string(),
        category: None,
        size_human: Some("1 KB".to_string()),
        page_count: Some(1),
        path: Some(format!("/archive/{filename}")),
        mtime: None,
    }
}

/// Content hash used for fixtures named `filename`.
pub fn hash_for(filename: &str) -> String {
    let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in filename.bytes() {
        acc ^= u64::from(byte);
        acc = acc.wrapping_mul(0x0100_0000_01b3);
    }
    format!("{acc:032x}")
}

/// A document row builder.
#[derive(Debug, Clone)]
pub struct TestDocument {
    pub md5: String,
    pub text: String,
    pub snippet: Option<String>,
    pub filename: String,
    pub category: Option<String>,
    pub size_human: Option<String>,
    pub page_count: Option<i64>,
    pub path: Option<String>,
    /// Modified time as the store would render it, e.g. `2024-03-05 10:20:30`.
    pub mtime: Option<String>,
}

impl TestDocument {
    /// Set the full text. The snippet is the first 40 characters.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self.snippet = Some(text.chars().take(40).collect());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Set the modified time.
    pub fn modified(mut self, mtime: &str) -> Self {
        self.mtime = Some(mtime.to_string());
        self
    }

    /// Row keyed by the primary table's column names.
    pub fn row(&self) -> Map<String, JsonValue> {
        object(json!({
            "md5": self.md5,
            "text": self.text,
            "snippet": self.snippet,
            "filename": self.filename,
            "category": self.category,
            "size_human": self.size_human,
            "page_count": self.page_count,
            "path": self.path,
            "mtime": self.mtime,
        }))
    }
}

/// Create a summary row for the document named `filename`.
pub fn test_summary(filename: &str, summary: &str) -> TestSummary {
    TestSummary {
        md5: hash_for(filename),
        summary: summary.to_string(),
        subcategory: None,
    }
}

/// A summary row builder.
#[derive(Debug, Clone)]
pub struct TestSummary {
    pub md5: String,
    pub summary: String,
    pub subcategory: Option<String>,
}

impl TestSummary {
    pub fn with_subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = Some(subcategory.to_string());
        self
    }

    /// Row keyed by the summary table's column names.
    pub fn row(&self) -> Map<String, JsonValue> {
        object(json!({
            "md5": self.md5,
            "summary": self.summary,
            "subcategory": self.subcategory,
        }))
    }
}

fn object(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    }
}

/// Assertion helpers for JSON responses.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value lacks a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to lack key '{key}', got: {value}"
        );
    }

    /// Filenames of a list of result rows, in order.
    pub fn filenames(rows: &Value) -> Vec<String> {
        rows.as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("filename")?.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
