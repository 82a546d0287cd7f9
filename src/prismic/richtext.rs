//! Structured text blocks and their conversion to plain text or HTML

use serde::{Deserialize, Serialize};

use crate::helpers::{escape_html, escape_with_breaks, image_tag};

/// Kind of a structured text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Preformatted,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

/// One structured text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RichTextBlock {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Embed payload (`embed_url`, `html`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<serde_json::Value>,
}

impl RichTextBlock {
    /// A paragraph with no formatting
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn has_text(&self) -> bool {
        !matches!(
            self.kind,
            BlockKind::Image | BlockKind::Embed | BlockKind::Unknown
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over a range of a block's text.
///
/// Offsets count UTF-16 code units, as the content API emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpanData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Converts structured text into plain text and markup
pub trait RichTextRenderer: Send + Sync {
    /// Plain text of every text-bearing block
    fn as_text(&self, blocks: &[RichTextBlock]) -> String;

    /// HTML markup of the blocks
    fn as_html(&self, blocks: &[RichTextBlock]) -> String;
}

/// Default renderer following the content API's structured text semantics
#[derive(Debug, Clone)]
pub struct PrismicRichText {
    root: String,
}

impl PrismicRichText {
    /// `root` prefixes links to other documents
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    fn resolve_link(&self, data: &SpanData) -> String {
        match data.link_type.as_deref() {
            Some("Document") => match (data.doc_type.as_deref(), data.uid.as_deref()) {
                (Some(doc_type), Some(uid)) => format!("{}/{}/{}", self.root, doc_type, uid),
                _ => format!("{}/", self.root),
            },
            _ => data.url.clone().unwrap_or_default(),
        }
    }

    fn render_block(&self, block: &RichTextBlock) -> String {
        match block.kind {
            BlockKind::Paragraph => format!("<p>{}</p>", self.render_spans(block)),
            BlockKind::Preformatted => format!("<pre>{}</pre>", self.render_spans(block)),
            BlockKind::Heading1 => format!("<h1>{}</h1>", self.render_spans(block)),
            BlockKind::Heading2 => format!("<h2>{}</h2>", self.render_spans(block)),
            BlockKind::Heading3 => format!("<h3>{}</h3>", self.render_spans(block)),
            BlockKind::Heading4 => format!("<h4>{}</h4>", self.render_spans(block)),
            BlockKind::Heading5 => format!("<h5>{}</h5>", self.render_spans(block)),
            BlockKind::Heading6 => format!("<h6>{}</h6>", self.render_spans(block)),
            BlockKind::ListItem | BlockKind::OListItem => {
                format!("<li>{}</li>", self.render_spans(block))
            }
            BlockKind::Image => match &block.url {
                Some(url) => format!(
                    r#"<p class="block-img">{}</p>"#,
                    image_tag(url, block.alt.as_deref())
                ),
                None => String::new(),
            },
            BlockKind::Embed => render_embed(block),
            BlockKind::Unknown => String::new(),
        }
    }

    /// Apply spans to a block's text.
    ///
    /// Overlapping spans are closed and reopened so the output stays
    /// well-nested.
    fn render_spans(&self, block: &RichTextBlock) -> String {
        if block.spans.is_empty() {
            return escape_with_breaks(&block.text);
        }

        let units: Vec<u16> = block.text.encode_utf16().collect();
        let len = units.len();
        let spans: Vec<&Span> = block
            .spans
            .iter()
            .filter(|s| s.start < s.end && s.start < len && s.kind != SpanKind::Unknown)
            .collect();

        let mut bounds: Vec<usize> = vec![0, len];
        for span in &spans {
            bounds.push(span.start);
            bounds.push(span.end.min(len));
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut out = String::new();
        let mut open: Vec<&Span> = Vec::new();

        for window in bounds.windows(2) {
            let (from, to) = (window[0], window[1]);

            // Close spans that ended, reopening any that were nested inside them
            if open.iter().any(|s| s.end.min(len) <= from) {
                let mut reopen = Vec::new();
                while let Some(span) = open.pop() {
                    out.push_str(self.closing_tag(span));
                    if span.end.min(len) > from {
                        reopen.push(span);
                    }
                }
                for span in reopen.into_iter().rev() {
                    out.push_str(&self.opening_tag(span));
                    open.push(span);
                }
            }

            let mut starting: Vec<&Span> =
                spans.iter().copied().filter(|s| s.start == from).collect();
            starting.sort_by(|a, b| b.end.cmp(&a.end));
            for span in starting {
                out.push_str(&self.opening_tag(span));
                open.push(span);
            }

            let text = String::from_utf16_lossy(&units[from..to]);
            out.push_str(&escape_with_breaks(&text));
        }

        while let Some(span) = open.pop() {
            out.push_str(self.closing_tag(span));
        }

        out
    }

    fn opening_tag(&self, span: &Span) -> String {
        match span.kind {
            SpanKind::Strong => "<strong>".to_string(),
            SpanKind::Em => "<em>".to_string(),
            SpanKind::Hyperlink => {
                let data = span.data.clone().unwrap_or_default();
                let target = match data.target.as_deref() {
                    Some(target) => format!(
                        r#" target="{}" rel="noopener noreferrer""#,
                        escape_html(target)
                    ),
                    None => String::new(),
                };
                format!(
                    r#"<a href="{}"{}>"#,
                    escape_html(&self.resolve_link(&data)),
                    target
                )
            }
            SpanKind::Label => {
                let label = span
                    .data
                    .as_ref()
                    .and_then(|d| d.label.as_deref())
                    .unwrap_or("");
                format!(r#"<span class="{}">"#, escape_html(label))
            }
            SpanKind::Unknown => String::new(),
        }
    }

    fn closing_tag(&self, span: &Span) -> &'static str {
        match span.kind {
            SpanKind::Strong => "</strong>",
            SpanKind::Em => "</em>",
            SpanKind::Hyperlink => "</a>",
            SpanKind::Label => "</span>",
            SpanKind::Unknown => "",
        }
    }
}

impl Default for PrismicRichText {
    fn default() -> Self {
        Self::new("/")
    }
}

impl RichTextRenderer for PrismicRichText {
    fn as_text(&self, blocks: &[RichTextBlock]) -> String {
        blocks
            .iter()
            .filter(|b| b.has_text())
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn as_html(&self, blocks: &[RichTextBlock]) -> String {
        let mut html = String::new();
        let mut list: Option<BlockKind> = None;

        for block in blocks {
            let item_kind = match block.kind {
                BlockKind::ListItem | BlockKind::OListItem => Some(block.kind),
                _ => None,
            };

            if list != item_kind {
                match list {
                    Some(BlockKind::OListItem) => html.push_str("</ol>"),
                    Some(_) => html.push_str("</ul>"),
                    None => {}
                }
                match item_kind {
                    Some(BlockKind::OListItem) => html.push_str("<ol>"),
                    Some(_) => html.push_str("<ul>"),
                    None => {}
                }
                list = item_kind;
            }

            html.push_str(&self.render_block(block));
        }

        match list {
            Some(BlockKind::OListItem) => html.push_str("</ol>"),
            Some(_) => html.push_str("</ul>"),
            None => {}
        }

        html
    }
}

fn render_embed(block: &RichTextBlock) -> String {
    let Some(oembed) = &block.oembed else {
        return String::new();
    };
    let url = oembed
        .get("embed_url")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let kind = oembed.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let markup = oembed.get("html").and_then(|v| v.as_str()).unwrap_or("");
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
        escape_html(url),
        escape_html(kind),
        markup
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(json: &str) -> Vec<RichTextBlock> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_block_without_type_is_paragraph() {
        let body = blocks(r#"[{"text": "one two three"}]"#);
        assert_eq!(body[0].kind, BlockKind::Paragraph);
        assert!(body[0].spans.is_empty());
    }

    #[test]
    fn test_as_text_joins_blocks() {
        let body = blocks(
            r#"[
                {"type": "heading2", "text": "Title", "spans": []},
                {"type": "image", "url": "https://img/x.png"},
                {"type": "paragraph", "text": "Body text", "spans": []}
            ]"#,
        );
        assert_eq!(PrismicRichText::default().as_text(&body), "Title Body text");
        assert_eq!(PrismicRichText::default().as_text(&[]), "");
    }

    #[test]
    fn test_as_html_escapes_and_breaks() {
        let body = vec![RichTextBlock::paragraph("a < b\nc")];
        assert_eq!(
            PrismicRichText::default().as_html(&body),
            "<p>a &lt; b<br />c</p>"
        );
    }

    #[test]
    fn test_as_html_spans() {
        let body = blocks(
            r#"[{"type": "paragraph", "text": "Hello bold world", "spans": [
                {"start": 6, "end": 10, "type": "strong"},
                {"start": 11, "end": 16, "type": "hyperlink",
                 "data": {"link_type": "Web", "url": "https://rust-lang.org", "target": "_blank"}}
            ]}]"#,
        );
        assert_eq!(
            PrismicRichText::default().as_html(&body),
            r#"<p>Hello <strong>bold</strong> <a href="https://rust-lang.org" target="_blank" rel="noopener noreferrer">world</a></p>"#
        );
    }

    #[test]
    fn test_overlapping_spans_stay_nested() {
        let body = blocks(
            r#"[{"type": "paragraph", "text": "abcdef", "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 2, "end": 6, "type": "em"}
            ]}]"#,
        );
        assert_eq!(
            PrismicRichText::default().as_html(&body),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_span_offsets_are_utf16() {
        let body = blocks(
            r#"[{"type": "paragraph", "text": "né 🚀 go", "spans": [
                {"start": 6, "end": 8, "type": "em"}
            ]}]"#,
        );
        assert_eq!(
            PrismicRichText::default().as_html(&body),
            "<p>né 🚀 <em>go</em></p>"
        );
    }

    #[test]
    fn test_lists_are_grouped() {
        let body = blocks(
            r#"[
                {"type": "list-item", "text": "a"},
                {"type": "list-item", "text": "b"},
                {"type": "o-list-item", "text": "c"},
                {"type": "paragraph", "text": "d"}
            ]"#,
        );
        assert_eq!(
            PrismicRichText::default().as_html(&body),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn test_document_links_and_images() {
        let body = blocks(
            r#"[
                {"type": "paragraph", "text": "see", "spans": [
                    {"start": 0, "end": 3, "type": "hyperlink",
                     "data": {"link_type": "Document", "type": "post", "uid": "other"}}
                ]},
                {"type": "image", "url": "https://img/x.png", "alt": "x"},
                {"type": "some-future-block", "text": "ignored"}
            ]"#,
        );
        assert_eq!(
            PrismicRichText::new("/blog/").as_html(&body),
            r#"<p><a href="/blog/post/other">see</a></p><p class="block-img"><img src="https://img/x.png" alt="x" /></p>"#
        );
    }
}
