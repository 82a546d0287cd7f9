//! Listing state behind the home page and its "load more" button
//!
//! A [`Listing`] holds the posts shown so far and the cursor of the next
//! page. Loading is split in two phases so an owner that shares the listing
//! behind a lock can release it while the request is in flight:
//!
//! 1. [`Listing::begin_load`] hands out a [`LoadTicket`] and marks the
//!    listing as loading. Further calls are refused until the ticket is
//!    settled.
//! 2. [`Listing::complete`] or [`Listing::fail`] settles the ticket.
//!
//! [`Listing::load_more`] runs both phases for single owners.

use std::collections::HashSet;
use thiserror::Error;

use super::post::{PostSummary, PostsPage};
use crate::helpers::DateFormatter;
use crate::prismic::{ContentClient, ContentError};

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("No more posts to load")]
    Exhausted,

    #[error("A page is already being loaded")]
    InFlight,

    #[error("Cursor was already loaded: {0}")]
    CursorLoop(String),

    #[error("Response belongs to an outdated load request")]
    StaleTicket,

    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    /// The last load failed; the cursor is kept so it can be tried again
    Failed(String),
}

/// Permission to fetch the page at `cursor`
#[derive(Debug, PartialEq, Eq)]
pub struct LoadTicket {
    id: u64,
    cursor: String,
}

impl LoadTicket {
    pub fn cursor(&self) -> &str {
        &self.cursor
    }
}

/// Posts shown so far plus the cursor of the next page
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<PostSummary>,
    cursor: Option<String>,
    state: LoadState,
    pending: Option<u64>,
    issued: u64,
    loaded: HashSet<String>,
    formatter: DateFormatter,
}

impl Listing {
    /// Start from the first page; publication dates are replaced by their
    /// display form
    pub fn new(page: PostsPage, formatter: DateFormatter) -> Self {
        let mut listing = Self {
            posts: Vec::with_capacity(page.results.len()),
            cursor: page.next_page.clone(),
            state: LoadState::Idle,
            pending: None,
            issued: 0,
            loaded: HashSet::new(),
            formatter,
        };
        listing.append(page.results);
        listing
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the "load more" control should be shown
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Reserve the next page for loading
    pub fn begin_load(&mut self) -> Result<LoadTicket, ListingError> {
        if self.pending.is_some() {
            return Err(ListingError::InFlight);
        }
        let cursor = self.cursor.clone().ok_or(ListingError::Exhausted)?;
        if self.loaded.contains(&cursor) {
            return Err(ListingError::CursorLoop(cursor));
        }

        self.issued += 1;
        self.pending = Some(self.issued);
        self.state = LoadState::Loading;
        Ok(LoadTicket {
            id: self.issued,
            cursor,
        })
    }

    /// Append a fetched page and move the cursor; returns how many posts
    /// were added
    pub fn complete(&mut self, ticket: LoadTicket, page: PostsPage) -> Result<usize, ListingError> {
        self.settle(&ticket)?;

        self.loaded.insert(ticket.cursor);
        let added = page.results.len();
        self.append(page.results);
        self.cursor = page.next_page;
        self.state = LoadState::Idle;

        tracing::debug!(
            "Loaded {} more posts ({} total, more: {})",
            added,
            self.posts.len(),
            self.has_more()
        );
        Ok(added)
    }

    /// Record a failed load; posts and cursor stay untouched
    pub fn fail(&mut self, ticket: LoadTicket, error: &ContentError) -> Result<(), ListingError> {
        self.settle(&ticket)?;
        tracing::warn!("Loading {} failed: {}", ticket.cursor, error);
        self.state = LoadState::Failed(error.to_string());
        Ok(())
    }

    /// Fetch the next page through `client` and append it
    pub async fn load_more(&mut self, client: &dyn ContentClient) -> Result<usize, ListingError> {
        let ticket = self.begin_load()?;
        match client.fetch_page(ticket.cursor()).await {
            Ok(response) => self.complete(ticket, PostsPage::from_search(response)),
            Err(e) => {
                self.fail(ticket, &e)?;
                Err(e.into())
            }
        }
    }

    /// Snapshot of the listing in wire form
    pub fn to_page(&self) -> PostsPage {
        PostsPage {
            results: self.posts.clone(),
            next_page: self.cursor.clone(),
        }
    }

    fn settle(&mut self, ticket: &LoadTicket) -> Result<(), ListingError> {
        if self.pending != Some(ticket.id) {
            return Err(ListingError::StaleTicket);
        }
        self.pending = None;
        Ok(())
    }

    fn append(&mut self, posts: Vec<PostSummary>) {
        let formatted: Vec<_> = posts.into_iter().map(|p| self.format(p)).collect();
        self.posts.extend(formatted);
    }

    fn format(&self, mut post: PostSummary) -> PostSummary {
        post.first_publication_date = self
            .formatter
            .format_opt(post.first_publication_date.as_deref());
        post
    }
}
