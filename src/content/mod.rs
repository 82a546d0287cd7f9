//! Content module - post models, the listing state and reading time

pub mod listing;
mod post;
mod reading_time;

pub use listing::{Listing, ListingError, LoadState, LoadTicket};
pub use post::{
    Banner, ContentSection, PostDetail, PostDetailData, PostSummary, PostSummaryData, PostsPage,
};
pub use reading_time::{reading_time, reading_time_at, word_count, WORDS_PER_MINUTE};
