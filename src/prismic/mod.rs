//! Content API adapter
//!
//! Posts live in a Prismic repository. Everything that talks to it goes
//! through [`ContentClient`], so pages and tests can swap the HTTP client for
//! an in-memory one.

mod client;
mod document;
mod error;
#[cfg(test)]
pub(crate) mod memory;
pub mod richtext;

use async_trait::async_trait;
use std::collections::HashSet;

pub use client::PrismicClient;
pub use document::{at, ApiInfo, ApiRef, Document, QueryOptions, SearchResponse};
pub use error::{ContentError, Result};
pub use richtext::{PrismicRichText, RichTextBlock, RichTextRenderer};

/// Read access to the documents of a content repository
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// First page of documents of a type, plus the cursor of the next one
    async fn get_by_type(&self, doc_type: &str, options: &QueryOptions) -> Result<SearchResponse>;

    /// The document of a type with the given uid
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document>;

    /// The page a cursor points at
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse>;

    /// Every document of a type, following cursors to the last page
    async fn get_all_by_type(&self, doc_type: &str, page_size: usize) -> Result<Vec<Document>> {
        let first = self
            .get_by_type(doc_type, &QueryOptions::page_size(page_size))
            .await?;
        let mut documents = first.results;
        let mut next = first.next_page;
        let mut visited = HashSet::new();

        while let Some(cursor) = next {
            if !visited.insert(cursor.clone()) {
                return Err(ContentError::CursorLoop(cursor));
            }
            let page = self.fetch_page(&cursor).await?;
            documents.extend(page.results);
            next = page.next_page;
        }

        tracing::debug!("Fetched {} {} documents", documents.len(), doc_type);
        Ok(documents)
    }
}
