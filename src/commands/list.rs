//! List posts from the content API

use anyhow::Result;
use std::io::Write;

use crate::content::{Listing, PostsPage};
use crate::helpers::DateFormatter;
use crate::prismic::{ContentClient, QueryOptions};
use crate::Blog;

/// Print the first page of posts, or every page with `all`
pub async fn run(blog: &Blog, all: bool) -> Result<()> {
    let client = blog.client()?;
    let listing = load(blog, &client, all).await?;
    print(&listing, &mut std::io::stdout().lock())
}

/// Load the listing the way the home page does
pub async fn load(blog: &Blog, client: &dyn ContentClient, all: bool) -> Result<Listing> {
    let api = &blog.config.api;
    let first = client
        .get_by_type(&api.document_type, &QueryOptions::page_size(api.page_size))
        .await?;
    let mut listing = Listing::new(
        PostsPage::from_search(first),
        DateFormatter::new(&blog.config.date)?,
    );

    while all && listing.has_more() {
        listing.load_more(client).await?;
    }
    Ok(listing)
}

fn print(listing: &Listing, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Posts ({}):", listing.posts().len())?;
    for post in listing.posts() {
        writeln!(
            out,
            "  {} - {} [{}]",
            post.first_publication_date.as_deref().unwrap_or("-"),
            post.data.title,
            post.uid
        )?;
    }
    if listing.has_more() {
        writeln!(out, "More posts available (use --all)")?;
    }
    Ok(())
}
