//! Generator module - exports the whole blog as static files

use anyhow::{bail, Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::content::{Listing, PostDetail, PostsPage};
use crate::helpers::{url_for, DateFormatter};
use crate::prismic::{ContentClient, PrismicRichText, QueryOptions};
use crate::templates::{PostView, TemplateRenderer, LOGO_SVG, STYLE_CSS};
use crate::Blog;

/// Largest page the content API serves
const MAX_PAGE_SIZE: usize = 100;

/// What a generation run wrote
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateStats {
    /// Listing pages, the home page included
    pub pages: usize,
    pub posts: usize,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    client: Arc<dyn ContentClient>,
    renderer: TemplateRenderer,
    richtext: PrismicRichText,
    formatter: DateFormatter,
}

impl Generator {
    pub fn new(blog: &Blog, client: Arc<dyn ContentClient>) -> Result<Self> {
        Ok(Self {
            renderer: TemplateRenderer::new(&blog.config)?,
            richtext: PrismicRichText::new(&blog.config.root),
            formatter: DateFormatter::new(&blog.config.date)?,
            blog: blog.clone(),
            client,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.blog.public_dir)?;

        let pages = self.generate_listing().await?;
        let posts = self.generate_posts().await?;
        self.generate_static()?;

        Ok(GenerateStats { pages, posts })
    }

    /// Home page plus one JSON file per further page of the listing
    async fn generate_listing(&self) -> Result<usize> {
        let api = &self.blog.config.api;
        let first = self
            .client
            .get_by_type(&api.document_type, &QueryOptions::page_size(api.page_size))
            .await
            .context("Failed to load the first page of posts")?;

        let listing = Listing::new(PostsPage::from_search(first), self.formatter.clone());
        let mut upstream = listing.cursor().map(str::to_string);
        let cursor = upstream.as_ref().map(|_| self.page_url(2));

        let html = self.renderer.render_home(&listing, cursor.as_deref())?;
        self.write("index.html", html)?;

        let mut number = 1;
        let mut visited = HashSet::new();
        while let Some(next) = upstream.take() {
            if !visited.insert(next.clone()) {
                bail!("Listing cursor repeats after page {}: {}", number, next);
            }
            number += 1;
            let response = self
                .client
                .fetch_page(&next)
                .await
                .with_context(|| format!("Failed to load page {}", number))?;

            let mut page =
                Listing::new(PostsPage::from_search(response), self.formatter.clone()).to_page();
            upstream = page.next_page.take();
            page.next_page = upstream.as_ref().map(|_| self.page_url(number + 1));

            self.write(&page_path(number), serde_json::to_string(&page)?)?;
        }

        tracing::info!("Generated {} listing pages", number);
        Ok(number)
    }

    /// One page per post of every listing page
    async fn generate_posts(&self) -> Result<usize> {
        let documents = self
            .client
            .get_all_by_type(&self.blog.config.api.document_type, MAX_PAGE_SIZE)
            .await
            .context("Failed to load posts")?;

        let mut count = 0;
        for document in &documents {
            let post = match PostDetail::from_document(document) {
                Ok(post) => post,
                Err(e) => {
                    tracing::warn!("Skipping document {}: {}", document.id, e);
                    continue;
                }
            };
            if !is_safe_segment(&post.uid) {
                tracing::warn!("Skipping post with unusable uid {:?}", post.uid);
                continue;
            }

            let view = PostView::build(
                &post,
                &self.richtext,
                &self.formatter,
                self.blog.config.post.words_per_minute,
            );
            let html = self.renderer.render_post(&view)?;
            self.write(&format!("post/{}/index.html", post.uid), html)?;
            count += 1;
        }

        tracing::info!("Generated {} posts", count);
        Ok(count)
    }

    /// 404 page and embedded assets
    fn generate_static(&self) -> Result<()> {
        self.write("404.html", self.renderer.render_not_found()?)?;
        self.write(self.blog.config.logo.trim_start_matches('/'), LOGO_SVG)?;
        self.write("css/style.css", STYLE_CSS)?;
        Ok(())
    }

    fn page_url(&self, number: usize) -> String {
        url_for(&self.blog.config, &page_path(number))
    }

    fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        write_file(&output_path, contents.as_ref())?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

fn page_path(number: usize) -> String {
    format!("api/posts/{}.json", number)
}

/// A uid is written as a single directory name
fn is_safe_segment(uid: &str) -> bool {
    !uid.is_empty() && uid != "." && uid != ".." && !uid.contains(['/', '\\'])
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}

/// Every file below `dir`, relative to it; symlinks are not followed
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::prismic::memory::{detail_document, summary_document, MemoryContent};
    use tempfile::TempDir;

    fn blog(dir: &TempDir) -> Blog {
        Blog {
            config: SiteConfig::default(),
            base_dir: dir.path().to_path_buf(),
            public_dir: dir.path().join("public"),
        }
    }

    fn content() -> Arc<MemoryContent> {
        Arc::new(MemoryContent::paged(vec![
            vec![detail_document("a", "Post A", "one two three")],
            vec![summary_document("b", "Post B")],
            vec![summary_document("c", "Post C")],
        ]))
    }

    #[tokio::test]
    async fn test_generate_writes_site() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        let generator = Generator::new(&blog, content()).unwrap();

        let stats = generator.generate().await.unwrap();
        assert_eq!(stats, GenerateStats { pages: 3, posts: 3 });

        let files = list_files(&blog.public_dir).unwrap();
        let files: Vec<_> = files.iter().map(|f| f.to_string_lossy().to_string()).collect();
        for expected in [
            "404.html",
            "api/posts/2.json",
            "api/posts/3.json",
            "css/style.css",
            "images/logo.svg",
            "index.html",
            "post/a/index.html",
            "post/b/index.html",
            "post/c/index.html",
        ] {
            assert!(files.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_cursor_pages_chain() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        Generator::new(&blog, content())
            .unwrap()
            .generate()
            .await
            .unwrap();

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(index.contains("Carregar mais posts"));
        assert!(index.contains(r#"data-cursor="/api/posts/2.json""#));

        let second: PostsPage =
            serde_json::from_str(&fs::read_to_string(blog.public_dir.join("api/posts/2.json")).unwrap())
                .unwrap();
        assert_eq!(second.results[0].uid, "b");
        assert_eq!(
            second.results[0].first_publication_date.as_deref(),
            Some("25 mar 2021")
        );
        assert_eq!(second.next_page.as_deref(), Some("/api/posts/3.json"));

        let last: PostsPage =
            serde_json::from_str(&fs::read_to_string(blog.public_dir.join("api/posts/3.json")).unwrap())
                .unwrap();
        assert_eq!(last.next_page, None);
    }

    #[tokio::test]
    async fn test_single_page_has_no_button() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        let client = Arc::new(MemoryContent::paged(vec![vec![detail_document(
            "a", "Post A", "text",
        )]]));
        let stats = Generator::new(&blog, client).unwrap().generate().await.unwrap();
        assert_eq!(stats.pages, 1);

        let index = fs::read_to_string(blog.public_dir.join("index.html")).unwrap();
        assert!(!index.contains("Carregar mais posts"));
        assert!(!blog.public_dir.join("api").exists());

        let post = fs::read_to_string(blog.public_dir.join("post/a/index.html")).unwrap();
        assert!(post.contains("1 min"));
    }

    #[tokio::test]
    async fn test_generate_stops_on_cursor_loop() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        let client = Arc::new(
            MemoryContent::paged(vec![
                vec![summary_document("a", "Post A")],
                vec![summary_document("b", "Post B")],
            ])
            .with_cursor_loop(),
        );

        let err = Generator::new(&blog, client)
            .unwrap()
            .generate()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("repeats"));
    }

    #[tokio::test]
    async fn test_generate_fails_when_api_is_down() {
        let dir = TempDir::new().unwrap();
        let blog = blog(&dir);
        let client = content();
        client.set_failing(true);
        assert!(Generator::new(&blog, client).unwrap().generate().await.is_err());
    }

    #[test]
    fn test_safe_segment() {
        assert!(is_safe_segment("como-utilizar-hooks"));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment(""));
    }
}
