//! Built-in spacetraveling theme using the Tera template engine
//!
//! Templates and assets are embedded in the binary, so the server and the
//! generator need nothing on disk besides `_config.yml`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{self, Listing, PostDetail};
use crate::helpers::{post_url, url_for, DateFormatter};
use crate::prismic::RichTextRenderer;

/// Logo shown by the header
pub const LOGO_SVG: &str = include_str!("assets/logo.svg");
/// Site stylesheet
pub const STYLE_CSS: &str = include_str!("assets/style.css");

/// Seconds before the fallback placeholder reloads itself
pub const FALLBACK_REFRESH_SECS: u64 = 1;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("fallback.html", include_str!("spacetraveling/fallback.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("spacetraveling/partials/post_card.html"),
            ),
        ])?;

        let link_config = config.clone();
        tera.register_filter(
            "post_url",
            move |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let uid = tera::try_get_value!("post_url", "value", String, value);
                Ok(tera::Value::String(post_url(&link_config, &uid)))
            },
        );

        Ok(Self {
            tera,
            site: SiteData::new(config),
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Home page; the "load more" button is rendered only with a cursor
    pub fn render_home(&self, listing: &Listing, cursor: Option<&str>) -> Result<String> {
        let mut context = self.base_context();
        context.insert("posts", listing.posts());
        context.insert("cursor", &cursor);
        context.insert("post_base", &format!("{}/", post_url_base(&self.site.root)));
        self.render("index.html", &context)
    }

    /// Post page
    pub fn render_post(&self, post: &PostView) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", post);
        self.render("post.html", &context)
    }

    /// Placeholder shown while a post that was not pre-rendered is fetched
    pub fn render_fallback(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh_secs", &FALLBACK_REFRESH_SECS);
        self.render("fallback.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.render("not_found.html", &self.base_context())
    }

    pub fn render_error(&self, message: &str, current_path: &str) -> Result<String> {
        let mut context = self.base_context();
        context.insert("message", message);
        context.insert("current_path", current_path);
        self.render("error.html", &context)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }
}

fn post_url_base(root: &str) -> String {
    format!("{}/post", root.trim_end_matches('/'))
}

/// Site-wide values available to every template
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub root: String,
    pub logo_url: String,
    pub css_url: String,
}

impl SiteData {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            root: url_for(config, ""),
            logo_url: url_for(config, &config.logo),
            css_url: url_for(config, "css/style.css"),
        }
    }
}

/// Everything the post template shows
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub date: Option<String>,
    pub reading_time: usize,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: String,
}

impl PostView {
    /// Render section bodies and compute the reading time
    pub fn build(
        post: &PostDetail,
        richtext: &dyn RichTextRenderer,
        formatter: &DateFormatter,
        words_per_minute: usize,
    ) -> Self {
        let sections = post
            .data
            .content
            .iter()
            .map(|section| SectionView {
                heading: section.heading.clone(),
                html: richtext.as_html(&section.body),
            })
            .collect();

        Self {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            banner_url: post.data.banner.url.clone(),
            date: formatter.format_opt(post.first_publication_date.as_deref()),
            reading_time: content::reading_time_at(&post.data.content, richtext, words_per_minute),
            sections,
        }
    }
}
