//! Post models decoded from content API documents

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::prismic::{ContentError, Document, RichTextBlock, SearchResponse};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Unique slug, also the render key
    pub uid: String,

    /// Raw timestamp from the API, or the display date once formatted
    pub first_publication_date: Option<String>,

    pub data: PostSummaryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostSummaryData {
    #[serde(default, deserialize_with = "text_field")]
    pub title: String,
    #[serde(default, deserialize_with = "text_field")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "text_field")]
    pub author: String,
}

impl PostSummary {
    /// Decode the listing fields of a document
    pub fn from_document(document: &Document) -> Result<Self, ContentError> {
        Ok(Self {
            uid: document_uid(document)?,
            first_publication_date: document.first_publication_date.clone(),
            data: serde_json::from_value(document.data.clone())?,
        })
    }
}

/// A full post with its content sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    pub data: PostDetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostDetailData {
    #[serde(default, deserialize_with = "text_field")]
    pub title: String,
    #[serde(default, deserialize_with = "text_field")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "text_field")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Banner {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A heading followed by structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "text_field")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

impl PostDetail {
    /// Decode every field the post page needs
    pub fn from_document(document: &Document) -> Result<Self, ContentError> {
        Ok(Self {
            uid: document_uid(document)?,
            first_publication_date: document.first_publication_date.clone(),
            last_publication_date: document.last_publication_date.clone(),
            data: serde_json::from_value(document.data.clone())?,
        })
    }
}

/// A page of posts and the cursor of the next one.
///
/// This is also the JSON body served to the "load more" button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostsPage<T = PostSummary> {
    pub results: Vec<T>,
    pub next_page: Option<String>,
}

impl PostsPage<PostSummary> {
    /// Decode a search response, skipping documents that are not posts
    pub fn from_search(response: SearchResponse) -> Self {
        let results = response
            .results
            .iter()
            .filter_map(|document| match PostSummary::from_document(document) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping document {}: {}", document.id, e);
                    None
                }
            })
            .collect();

        Self {
            results,
            next_page: response.next_page,
        }
    }
}

fn document_uid(document: &Document) -> Result<String, ContentError> {
    document.uid.clone().ok_or_else(|| {
        ContentError::Decode(serde_json::Error::custom(format!(
            "document {} has no uid",
            document.id
        )))
    })
}

/// Accept key-text fields as strings and title fields as structured text
fn text_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Array(_) => {
            let blocks: Vec<RichTextBlock> =
                serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(blocks
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join(" "))
        }
        other => Err(D::Error::custom(format!("expected text, got {}", other))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
