//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::generator::{GenerateStats, Generator};
use crate::Blog;

/// Export the blog into the public directory
pub async fn run(blog: &Blog) -> Result<GenerateStats> {
    let start = std::time::Instant::now();

    let client = Arc::new(blog.client()?);
    let generator = Generator::new(blog, client)?;
    let stats = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} pages and {} posts in {:.2}s",
        stats.pages,
        stats.posts,
        duration.as_secs_f64()
    );

    Ok(stats)
}
