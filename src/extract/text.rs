//! Text helpers: visible-text collection and post-processing.

use std::sync::OnceLock;

use regex::Regex;
use scraper::node::Node;
use scraper::ElementRef;

/// Maximum characters of content leaving the extractor
pub const MAX_CONTENT_CHARS: usize = 3000;

/// Marker appended when content is truncated
pub const ELLIPSIS: &str = "...";

/// Elements whose text never counts as readable content
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Elements that end a line of text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "li", "ul", "ol", "br", "h1", "h2", "h3", "h4", "h5",
    "h6", "blockquote", "tr", "td", "th", "pre", "figcaption", "header", "footer", "main",
];

const BOILERPLATE_PHRASES: &[&str] = &[
    "click here",
    "read more",
    "subscribe",
    "sign up",
    "advertisement",
    "share this",
    "follow us",
    "cookie policy",
    "accept cookies",
    "privacy policy",
    "all rights reserved",
];

pub(crate) fn is_hidden_tag(name: &str) -> bool {
    HIDDEN_TAGS.contains(&name)
}

/// Text of an element, skipping script/style subtrees.
///
/// Block-level children are separated by newlines so adjacent paragraphs
/// do not run together.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect(element, &mut out);
    out
}

fn collect(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if is_hidden_tag(el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect(child_el, out);
                }
                if BLOCK_TAGS.contains(&el.name()) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Trimmed character length of an element's visible text
pub fn text_len(element: ElementRef<'_>) -> usize {
    visible_text(element).trim().chars().count()
}

/// Collapse all whitespace runs into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn boilerplate_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let alternatives: Vec<String> = BOILERPLATE_PHRASES
            .iter()
            .map(|p| regex::escape(p))
            .collect();
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
            .expect("boilerplate pattern is valid")
    })
}

/// Strip boilerplate phrases case-insensitively
pub fn strip_boilerplate(text: &str) -> String {
    boilerplate_regex().replace_all(text, "").into_owned()
}

/// Truncate to `max_chars` characters, appending the ellipsis marker if cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut truncated = text[..byte_idx].trim_end().to_string();
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => text.to_string(),
    }
}

/// Full post-processing applied to every extraction result
pub fn clean_content(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let stripped = strip_boilerplate(&collapsed);
    truncate_chars(&collapse_whitespace(&stripped), MAX_CONTENT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_visible_text_skips_scripts() {
        let html = Html::parse_fragment(
            "<div><p>Hello</p><script>var x = 1;</script><style>p{}</style><p>World</p></div>",
        );
        let selector = Selector::parse("div").unwrap();
        let div = html.select(&selector).next().unwrap();

        let text = collapse_whitespace(&visible_text(div));
        assert_eq!(text, "Hello World");
    }

    #[test]
    fn test_strip_boilerplate_case_insensitive() {
        let cleaned = strip_boilerplate("Great story. CLICK HERE to Subscribe now!");
        assert!(!cleaned.to_lowercase().contains("click here"));
        assert!(!cleaned.to_lowercase().contains("subscribe"));
        assert!(cleaned.contains("Great story."));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_chars("abcdefghijk", 10), "abcdefghij...");

        // Multi-byte characters are counted, not bytes
        let accented = "é".repeat(20);
        let truncated = truncate_chars(&accented, 5);
        assert_eq!(truncated, format!("{}...", "é".repeat(5)));
    }

    #[test]
    fn test_clean_content_caps_length() {
        let long = "word ".repeat(2000);
        let cleaned = clean_content(&long);
        assert!(cleaned.chars().count() <= MAX_CONTENT_CHARS + ELLIPSIS.len());
        assert!(cleaned.ends_with(ELLIPSIS));
    }
}
