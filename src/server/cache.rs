//! Rendered post pages kept by the server
//!
//! Each slug moves through `Loading -> Ready | NotFound | Failed`. Only the
//! request that claims a missing slug fetches it; everyone else sees the
//! loading placeholder until the entry settles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Entry {
    Loading,
    Ready {
        html: Arc<str>,
        rendered_at: Instant,
        refreshing: bool,
    },
    NotFound {
        checked_at: Instant,
    },
    Failed(String),
}

/// What the cache knows about a slug
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Rendered within the revalidation window
    Fresh(Arc<str>),
    /// Rendered, but due for regeneration
    Stale(Arc<str>),
    Loading,
    NotFound,
    /// The last fetch failed; the entry has been evicted
    Failed(String),
    Missing,
}

/// How a fetch for a slug ended
#[derive(Debug)]
pub enum Outcome {
    Rendered(String),
    NotFound,
    Failed(String),
}

pub struct PostCache {
    entries: RwLock<HashMap<String, Entry>>,
    revalidate: Duration,
}

impl PostCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            revalidate,
        }
    }

    pub async fn lookup(&self, slug: &str) -> Lookup {
        let mut entries = self.entries.write().await;
        let lookup = match entries.get(slug) {
            None => Lookup::Missing,
            Some(Entry::Loading) => Lookup::Loading,
            Some(Entry::Ready {
                html, rendered_at, ..
            }) => {
                if rendered_at.elapsed() < self.revalidate {
                    Lookup::Fresh(html.clone())
                } else {
                    Lookup::Stale(html.clone())
                }
            }
            Some(Entry::NotFound { checked_at }) => {
                if checked_at.elapsed() < self.revalidate {
                    Lookup::NotFound
                } else {
                    Lookup::Missing
                }
            }
            Some(Entry::Failed(message)) => Lookup::Failed(message.clone()),
        };

        if matches!(lookup, Lookup::Failed(_) | Lookup::Missing) {
            entries.remove(slug);
        }
        lookup
    }

    /// Mark a missing slug as loading; `false` if someone else got there first
    pub async fn claim(&self, slug: &str) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(slug) {
            return false;
        }
        entries.insert(slug.to_string(), Entry::Loading);
        true
    }

    /// Start regenerating a stale page; `false` if a refresh is already running
    pub async fn claim_refresh(&self, slug: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(slug) {
            Some(Entry::Ready { refreshing, .. }) if !*refreshing => {
                *refreshing = true;
                true
            }
            _ => false,
        }
    }

    /// Settle a slug after a fetch.
    ///
    /// A failed refresh of a page that is already rendered keeps serving the
    /// old page.
    pub async fn resolve(&self, slug: &str, outcome: Outcome) {
        let mut entries = self.entries.write().await;
        let entry = match outcome {
            Outcome::Rendered(html) => Entry::Ready {
                html: html.into(),
                rendered_at: Instant::now(),
                refreshing: false,
            },
            Outcome::NotFound => Entry::NotFound {
                checked_at: Instant::now(),
            },
            Outcome::Failed(message) => match entries.get_mut(slug) {
                Some(Entry::Ready { refreshing, .. }) => {
                    tracing::warn!("Keeping stale page for {}: {}", slug, message);
                    *refreshing = false;
                    return;
                }
                _ => Entry::Failed(message),
            },
        };
        entries.insert(slug.to_string(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
