//! HTTP server rendering pages from the content API on demand

mod cache;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub use cache::{Lookup, Outcome, PostCache};

use crate::config::{FallbackMode, SiteConfig};
use crate::content::{Listing, PostDetail, PostsPage};
use crate::helpers::{cursor_url, DateFormatter};
use crate::prismic::{
    ContentClient, ContentError, PrismicRichText, QueryOptions, RichTextRenderer,
};
use crate::templates::{PostView, TemplateRenderer, LOGO_SVG, STYLE_CSS};
use crate::Blog;

/// Largest page the content API serves
const MAX_PAGE_SIZE: usize = 100;

/// Server state
pub struct ServerState {
    config: SiteConfig,
    client: Arc<dyn ContentClient>,
    renderer: TemplateRenderer,
    richtext: Arc<dyn RichTextRenderer>,
    formatter: DateFormatter,
    cache: PostCache,
}

impl ServerState {
    pub fn new(config: SiteConfig, client: Arc<dyn ContentClient>) -> Result<Self> {
        let renderer = TemplateRenderer::new(&config)?;
        let formatter = DateFormatter::new(&config.date)?;
        let richtext = Arc::new(PrismicRichText::new(&config.root));
        let cache = PostCache::new(Duration::from_secs(config.post.revalidate_secs));

        Ok(Self {
            config,
            client,
            renderer,
            richtext,
            formatter,
            cache,
        })
    }

    /// Fetch the first page of posts
    async fn listing(&self) -> std::result::Result<Listing, ContentError> {
        let response = self
            .client
            .get_by_type(
                &self.config.api.document_type,
                &QueryOptions::page_size(self.config.api.page_size),
            )
            .await?;
        Ok(Listing::new(
            PostsPage::from_search(response),
            self.formatter.clone(),
        ))
    }

    /// Fetch and render one post
    async fn render_post(&self, slug: &str) -> Outcome {
        let document = match self
            .client
            .get_by_uid(&self.config.api.document_type, slug)
            .await
        {
            Ok(document) => document,
            Err(e) if e.is_not_found() => return Outcome::NotFound,
            Err(e) => return Outcome::Failed(e.to_string()),
        };
        self.render_document(&document)
    }

    fn render_document(&self, document: &crate::prismic::Document) -> Outcome {
        let post = match PostDetail::from_document(document) {
            Ok(post) => post,
            Err(e) => return Outcome::Failed(e.to_string()),
        };
        let view = PostView::build(
            &post,
            self.richtext.as_ref(),
            &self.formatter,
            self.config.post.words_per_minute,
        );
        match self.renderer.render_post(&view) {
            Ok(html) => Outcome::Rendered(html),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    /// Render every post up front, as if it had been generated at build time
    pub async fn prerender(&self) -> Result<usize> {
        let documents = self
            .client
            .get_all_by_type(&self.config.api.document_type, MAX_PAGE_SIZE)
            .await?;

        let mut rendered = 0;
        for document in &documents {
            let Some(uid) = document.uid.as_deref() else {
                continue;
            };
            match self.render_document(document) {
                outcome @ Outcome::Rendered(_) => {
                    self.cache.resolve(uid, outcome).await;
                    rendered += 1;
                }
                other => tracing::warn!("Skipping pre-render of {}: {:?}", uid, other),
            }
        }
        Ok(rendered)
    }
}

/// Build the router for a server state
pub fn router(state: Arc<ServerState>) -> Router {
    let logo_path = format!("/{}", state.config.logo.trim_start_matches('/'));
    let root = state.config.root.trim_end_matches('/').to_string();

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/posts", get(posts_api_handler))
        .route("/css/style.css", get(style_handler))
        .route(&logo_path, get(logo_handler))
        .fallback(not_found_handler)
        .with_state(state);

    let app = if root.is_empty() {
        app
    } else {
        Router::new().nest(&root, app)
    };

    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, prerender: bool) -> Result<()> {
    let client = Arc::new(blog.client()?);
    let state = Arc::new(ServerState::new(blog.config.clone(), client)?);

    if prerender {
        tracing::info!("Pre-rendering posts...");
        let count = state.prerender().await?;
        tracing::info!("Pre-rendered {} posts", count);
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let listing = match state.listing().await {
        Ok(listing) => listing,
        Err(e) => {
            tracing::error!("Failed to load posts: {}", e);
            return error_page(&state, &e.to_string(), "/");
        }
    };

    let cursor = listing.cursor().map(|c| cursor_url(&state.config, c));
    match state.renderer.render_home(&listing, cursor.as_deref()) {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_page(&state, &e.to_string(), "/"),
    }
}

#[derive(Debug, Deserialize)]
struct CursorQuery {
    cursor: String,
}

/// One more page for the "load more" button
async fn posts_api_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<CursorQuery>,
) -> Response {
    match state.client.fetch_page(&query.cursor).await {
        Ok(response) => {
            let listing = Listing::new(PostsPage::from_search(response), state.formatter.clone());
            let mut page = listing.to_page();
            page.next_page = page.next_page.map(|c| cursor_url(&state.config, &c));
            Json(page).into_response()
        }
        Err(ContentError::InvalidCursor(cursor)) => {
            tracing::warn!("Rejected cursor {}", cursor);
            api_error(StatusCode::BAD_REQUEST, "invalid cursor")
        }
        Err(e) => {
            tracing::error!("Failed to load more posts: {}", e);
            api_error(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Response {
    if let Some(response) = cached_post(&state, &slug, uri.path()).await {
        return response;
    }

    if !state.cache.claim(&slug).await {
        return fallback_page(&state);
    }

    let fetch = spawn_render(&state, &slug);
    match state.config.post.fallback {
        FallbackMode::Placeholder => {
            tracing::debug!("Rendering {} in the background", slug);
            fallback_page(&state)
        }
        FallbackMode::Blocking => {
            if let Err(e) = fetch.await {
                tracing::error!("Rendering {} did not finish: {}", slug, e);
            }
            cached_post(&state, &slug, uri.path())
                .await
                .unwrap_or_else(|| fallback_page(&state))
        }
    }
}

/// Fetch and render a slug on its own task.
///
/// The task settles the cache entry even when the request that started it
/// goes away.
fn spawn_render(state: &Arc<ServerState>, slug: &str) -> JoinHandle<()> {
    let background = state.clone();
    let slug = slug.to_string();
    tokio::spawn(async move {
        let outcome = background.render_post(&slug).await;
        background.cache.resolve(&slug, outcome).await;
    })
}

/// Answer from the cache; `None` when the slug has never been fetched
async fn cached_post(state: &Arc<ServerState>, slug: &str, path: &str) -> Option<Response> {
    let response = match state.cache.lookup(slug).await {
        Lookup::Fresh(html) => Html(html.to_string()).into_response(),
        Lookup::Stale(html) => {
            if state.cache.claim_refresh(slug).await {
                tracing::debug!("Regenerating {}", slug);
                spawn_render(state, slug);
            }
            Html(html.to_string()).into_response()
        }
        Lookup::Loading => fallback_page(state),
        Lookup::NotFound => not_found_page(state),
        Lookup::Failed(message) => error_page(state, &message, path),
        Lookup::Missing => return None,
    };
    Some(response)
}

async fn style_handler() -> Response {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS).into_response()
}

async fn logo_handler() -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], LOGO_SVG).into_response()
}

async fn not_found_handler(State(state): State<Arc<ServerState>>) -> Response {
    not_found_page(&state)
}

fn fallback_page(state: &ServerState) -> Response {
    match state.renderer.render_fallback() {
        Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn not_found_page(state: &ServerState) -> Response {
    match state.renderer.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn error_page(state: &ServerState, message: &str, path: &str) -> Response {
    match state.renderer.render_error(message, path) {
        Ok(html) => (StatusCode::BAD_GATEWAY, Html(html)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
