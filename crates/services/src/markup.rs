//! Reading passage markup: sanitizing, terminal rendering and plain text.

use std::collections::HashSet;

const READING_TAGS: [&str; 10] = ["p", "br", "strong", "em", "b", "i", "ruby", "rt", "rp", "span"];

/// Keeps only the inline tags reading passages are authored with.
#[must_use]
pub fn sanitize_reading_markup(html: &str) -> String {
    let tags: HashSet<&str> = READING_TAGS.into_iter().collect();
    ammonia::Builder::new()
        .tags(tags)
        .generic_attributes(HashSet::new())
        .clean(html)
        .to_string()
}

/// Renders a passage as Markdown for the terminal.
#[must_use]
pub fn reading_to_markdown(html: &str) -> String {
    let markdown = html2md::parse_html(&sanitize_reading_markup(html));
    markdown
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Entities the HTML serializer writes into text nodes. `&amp;` goes last so
/// an escaped entity such as `&amp;lt;` comes out as `&lt;`.
const TEXT_ESCAPES: [(&str, &str); 4] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", "\u{a0}"),
    ("&amp;", "&"),
];

/// The passage text with every tag removed and entities decoded.
#[must_use]
pub fn reading_plain_text(html: &str) -> String {
    let stripped = ammonia::Builder::empty().clean(html).to_string();
    let text = TEXT_ESCAPES
        .iter()
        .fold(stripped, |text, &(entity, ch)| text.replace(entity, ch));
    text.trim().to_owned()
}

/// Number of visible, non-whitespace characters in a passage.
#[must_use]
pub fn visible_len(html: &str) -> usize {
    reading_plain_text(html)
        .chars()
        .filter(|c| !c.is_whitespace())
        .count()
}
