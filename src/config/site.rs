//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `api.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub root: String,
    pub logo: String,

    // Directory
    pub public_dir: String,

    // Content API
    pub api: ApiConfig,

    // Date display
    pub date: DateConfig,

    // Post pages
    pub post: PostConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            root: "/".to_string(),
            logo: "images/logo.svg".to_string(),
            public_dir: "public".to_string(),
            api: ApiConfig::default(),
            date: DateConfig::default(),
            post: PostConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {:?}", path.as_ref()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            tracing::debug!("Using API endpoint from {}", ENDPOINT_ENV);
            self.api.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                self.api.access_token = Some(token);
            }
        }
    }
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "post".to_string(),
            page_size: 1,
            timeout_secs: 10,
        }
    }
}

/// Date display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    pub locale: String,
    pub timezone: String,
    pub format: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            locale: "pt_BR".to_string(),
            timezone: "UTC".to_string(),
            format: "%-d %b %Y".to_string(),
        }
    }
}

/// How a post page that was not pre-rendered is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Answer with a loading placeholder while the post is fetched
    #[default]
    Placeholder,
    /// Hold the request until the post is fetched
    Blocking,
}

/// Post page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub words_per_minute: usize,
    pub revalidate_secs: u64,
    pub fallback: FallbackMode,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            words_per_minute: crate::content::WORDS_PER_MINUTE,
            revalidate_secs: 60,
            fallback: FallbackMode::Placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.api.document_type, "post");
        assert_eq!(config.api.page_size, 1);
        assert_eq!(config.post.words_per_minute, 200);
        assert_eq!(config.post.fallback, FallbackMode::Placeholder);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
api:
  endpoint: https://myblog.cdn.prismic.io/api/v2
  page_size: 5
date:
  locale: en_US
post:
  fallback: blocking
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.api.endpoint, "https://myblog.cdn.prismic.io/api/v2");
        assert_eq!(config.api.page_size, 5);
        assert_eq!(config.api.document_type, "post");
        assert_eq!(config.date.locale, "en_US");
        assert_eq!(config.date.format, "%-d %b %Y");
        assert_eq!(config.post.fallback, FallbackMode::Blocking);
        assert_eq!(config.post.revalidate_secs, 60);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From File\npublic_dir: out\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From File");
        assert_eq!(config.public_dir, "out");
    }
}
