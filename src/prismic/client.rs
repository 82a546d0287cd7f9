//! reqwest-backed client for the Prismic REST API v2

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use super::document::{at, ApiInfo, Document, QueryOptions, SearchResponse};
use super::error::{ContentError, Result};
use super::ContentClient;
use crate::config::ApiConfig;

const USER_AGENT: &str = concat!("spacetraveling/", env!("CARGO_PKG_VERSION"));

/// How long a master ref is reused before the API is asked again
const REF_TTL: Duration = Duration::from_secs(5);

/// Client bound to one content repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    master: Arc<Mutex<Option<(String, Instant)>>>,
}

impl PrismicClient {
    /// Create a client from the `api` section of the site config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone(),
            master: Arc::new(Mutex::new(None)),
        })
    }

    /// The API endpoint this client queries
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a cursor URL points into this repository
    pub fn owns_cursor(&self, cursor: &str) -> bool {
        self.cursor_url(cursor).is_ok()
    }

    /// Current master ref, reused for `REF_TTL`
    async fn master_ref(&self) -> Result<String> {
        let mut cached = self.master.lock().await;
        if let Some((reference, fetched_at)) = cached.as_ref() {
            if fetched_at.elapsed() < REF_TTL {
                return Ok(reference.clone());
            }
        }

        let mut url = self.endpoint.clone();
        self.authorize(&mut url);
        let info: ApiInfo = self.get_json(url).await?;
        let reference = info
            .master_ref()
            .map(str::to_string)
            .ok_or(ContentError::NoMasterRef)?;

        *cached = Some((reference.clone(), Instant::now()));
        Ok(reference)
    }

    async fn search(&self, predicate: &str, options: &QueryOptions) -> Result<SearchResponse> {
        let reference = self.master_ref().await?;

        let mut url = Url::parse(&format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        ))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", &reference);
            query.append_pair("q", &format!("[{}]", predicate));
            if let Some(page_size) = options.page_size {
                query.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(page) = options.page {
                query.append_pair("page", &page.to_string());
            }
            if let Some(orderings) = &options.orderings {
                query.append_pair("orderings", orderings);
            }
        }
        self.authorize(&mut url);

        self.get_json(url).await
    }

    /// Resolve a cursor against this repository, rejecting foreign hosts
    fn cursor_url(&self, cursor: &str) -> Result<Url> {
        let url =
            Url::parse(cursor).map_err(|_| ContentError::InvalidCursor(cursor.to_string()))?;
        let same_origin = url.origin() == self.endpoint.origin();
        let base = self.endpoint.path().trim_end_matches('/');
        let same_api = url.path() == base
            || url
                .path()
                .strip_prefix(base)
                .is_some_and(|rest| rest.starts_with('/'));
        if !same_origin || !same_api {
            return Err(ContentError::InvalidCursor(cursor.to_string()));
        }
        Ok(url)
    }

    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url.path());
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: url.path().to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn get_by_type(&self, doc_type: &str, options: &QueryOptions) -> Result<SearchResponse> {
        self.search(&at("document.type", doc_type), options).await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document> {
        let predicate = at(&format!("my.{}.uid", doc_type), uid);
        let response = self.search(&predicate, &QueryOptions::page_size(1)).await?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse> {
        let mut url = self.cursor_url(cursor)?;
        self.authorize(&mut url);
        self.get_json(url).await
    }
}
