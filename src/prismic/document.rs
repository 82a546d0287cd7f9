//! Raw content API payloads

use serde::{Deserialize, Serialize};

/// A document as returned by the content API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,

    /// Unique slug within the document type
    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub last_publication_date: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub lang: Option<String>,

    /// Custom-type fields, decoded later into typed posts
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: usize,

    #[serde(default)]
    pub results_per_page: usize,

    #[serde(default)]
    pub total_results_size: usize,

    #[serde(default)]
    pub total_pages: usize,

    /// Cursor of the following page, `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default)]
    pub prev_page: Option<String>,

    #[serde(default)]
    pub results: Vec<Document>,
}

/// API metadata served at the endpoint root
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "ref")]
    pub reference: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    /// The ref pointing at published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// Options for a search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    pub orderings: Option<String>,
}

impl QueryOptions {
    pub fn page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}

/// Build an `at` predicate, e.g. `[at(document.type,"post")]`
pub fn at(path: &str, value: &str) -> String {
    let value = serde_json::Value::String(value.to_string()).to_string();
    format!("[at({},{})]", path, value)
}
