//! In-memory content repository for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{ContentClient, ContentError, Document, QueryOptions, Result, SearchResponse};

/// Serves fixed pages of post documents; page `n > 1` lives at cursor `/page{n}`
#[derive(Default)]
pub struct MemoryContent {
    pages: Mutex<Vec<Vec<Document>>>,
    failing: Mutex<bool>,
    looping: bool,
    delay: Option<Duration>,
    uid_lookups: AtomicUsize,
}

impl MemoryContent {
    pub fn paged(pages: Vec<Vec<Document>>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    /// The last page points back at itself instead of ending the listing
    pub fn with_cursor_loop(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Swap the repository contents, as if posts were republished
    pub fn set_pages(&self, pages: Vec<Vec<Document>>) {
        *self.pages.lock().unwrap() = pages;
    }

    /// Every fetch sleeps first, so tests can observe in-flight states
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every following request fail with a 500
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn uid_lookups(&self) -> usize {
        self.uid_lookups.load(Ordering::SeqCst)
    }

    fn cursor(&self, index: usize, total: usize) -> Option<String> {
        if index + 1 < total {
            Some(format!("/page{}", index + 2))
        } else if self.looping && total > 1 {
            Some(format!("/page{}", total))
        } else {
            None
        }
    }

    fn response(&self, index: usize) -> SearchResponse {
        let pages = self.pages.lock().unwrap();
        SearchResponse {
            page: index + 1,
            results_per_page: pages.first().map(Vec::len).unwrap_or(0),
            total_results_size: pages.iter().map(Vec::len).sum(),
            total_pages: pages.len(),
            next_page: self.cursor(index, pages.len()),
            prev_page: None,
            results: pages.get(index).cloned().unwrap_or_default(),
        }
    }

    async fn simulate(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if *self.failing.lock().unwrap() {
            return Err(ContentError::Status {
                status: 500,
                url: "/memory".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentClient for MemoryContent {
    async fn get_by_type(&self, _doc_type: &str, _options: &QueryOptions) -> Result<SearchResponse> {
        self.simulate().await?;
        Ok(self.response(0))
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document> {
        self.uid_lookups.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        self.pages
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .find(|d| d.uid.as_deref() == Some(uid))
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse> {
        self.simulate().await?;
        let total = self.pages.lock().unwrap().len();
        let index = cursor
            .strip_prefix("/page")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n >= 2 && *n <= total)
            .ok_or_else(|| ContentError::InvalidCursor(cursor.to_string()))?;
        Ok(self.response(index - 1))
    }
}

/// A post document with listing fields only
pub fn summary_document(uid: &str, title: &str) -> Document {
    serde_json::from_value(serde_json::json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": "2021-03-25T19:25:28+0000",
        "last_publication_date": "2021-03-25T19:25:28+0000",
        "data": {"title": title, "subtitle": format!("{} subtitle", title), "author": "Ana"}
    }))
    .unwrap()
}

/// A post document with a banner and one content section
pub fn detail_document(uid: &str, title: &str, body: &str) -> Document {
    serde_json::from_value(serde_json::json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": "2021-03-25T19:25:28+0000",
        "last_publication_date": "2021-03-25T19:25:28+0000",
        "data": {
            "title": title,
            "subtitle": format!("{} subtitle", title),
            "author": "Ana",
            "banner": {"url": "https://images.prismic.io/banner.png"},
            "content": [{"heading": "H", "body": [{"type": "paragraph", "text": body, "spans": []}]}]
        }
    }))
    .unwrap()
}
