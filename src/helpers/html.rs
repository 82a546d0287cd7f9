//! HTML helper functions

/// Escape text for use inside HTML content or attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text and turn line breaks into `<br />`
pub fn escape_with_breaks(s: &str) -> String {
    escape_html(s).replace('\n', "<br />")
}

/// Generate an image tag
pub fn image_tag(src: &str, alt: Option<&str>) -> String {
    format!(
        r#"<img src="{}" alt="{}" />"#,
        escape_html(src),
        escape_html(alt.unwrap_or(""))
    )
}
