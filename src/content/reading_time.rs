//! Reading time estimate for post pages

use super::post::ContentSection;
use crate::prismic::RichTextRenderer;

/// Average reading speed used for the estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Words in every section body.
///
/// Bodies are split on single spaces, so an empty body still counts as one
/// word and runs of spaces count the empty tokens between them.
pub fn word_count(content: &[ContentSection], renderer: &dyn RichTextRenderer) -> usize {
    content
        .iter()
        .map(|section| renderer.as_text(&section.body).split(' ').count())
        .sum()
}

/// Minutes needed to read the content, rounded up
pub fn reading_time(content: &[ContentSection], renderer: &dyn RichTextRenderer) -> usize {
    reading_time_at(content, renderer, WORDS_PER_MINUTE)
}

/// Minutes needed to read the content at a given speed, rounded up
pub fn reading_time_at(
    content: &[ContentSection],
    renderer: &dyn RichTextRenderer,
    words_per_minute: usize,
) -> usize {
    word_count(content, renderer).div_ceil(words_per_minute.max(1))
}
