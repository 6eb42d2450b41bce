//! Extraction Integration Tests
//!
//! Fallback chain order and output bounds on realistic pages.

use pagesong::extract::{ContentExtractor, Strategy, MAX_CONTENT_CHARS, PLACEHOLDER_CONTENT};

fn sentence(n: usize) -> String {
    format!("Sentence {} explains one more detail about river otters and their dens. ", n)
}

#[test]
fn test_long_article_is_capped() {
    let body: String = (0..200).map(sentence).collect();
    let html = format!(
        "<html><head><title>Otters</title></head><body><nav>Home About</nav><article><p>{}</p></article></body></html>",
        body
    );

    let extraction = ContentExtractor::new().extract_with_strategy(&html, "https://example.com/otters");
    let content = &extraction.content;

    assert_eq!(extraction.strategy, Strategy::Structural);
    assert!(content.content.chars().count() <= MAX_CONTENT_CHARS + 3);
    assert!(content.content.ends_with("..."));
    assert_eq!(content.title, "Otters");
    assert_eq!(content.url, "https://example.com/otters");
    assert_eq!(content.word_count, content.content.split_whitespace().count());
}

#[test]
fn test_paragraphs_only_page_uses_paragraph_fallback() {
    let html = "<html><body>\
        <p>Otters hold hands while they sleep on the water.</p>\
        <p>Ok</p>\
        <p>Their fur is the densest of any animal on earth.</p>\
        <p>They use stones as tools to open shellfish.</p>\
        </body></html>";

    let extraction = ContentExtractor::new().extract_with_strategy(html, "https://example.com");

    assert_eq!(extraction.strategy, Strategy::Paragraphs);
    assert!(extraction.content.content.starts_with("Otters hold hands"));
    assert!(extraction.content.content.contains("shellfish"));
    assert!(!extraction.content.content.contains(" Ok "));
}

#[test]
fn test_one_long_paragraph_keeps_the_others() {
    let html = format!(
        "<html><body>\
        <p>{}</p>\
        <p>Their fur is the densest of any animal on earth.</p>\
        <p>They use stones as tools to open shellfish.</p>\
        </body></html>",
        "Otters are semi aquatic mammals that spend most of their lives in rivers and along coasts, \
         diving for fish and crabs, grooming their thick coats for hours, and resting in dens dug \
         into banks where the cold water cannot reach."
    );

    let extraction = ContentExtractor::new().extract_with_strategy(&html, "https://example.com");

    assert_eq!(extraction.strategy, Strategy::Paragraphs);
    assert!(extraction.content.content.starts_with("Otters are semi aquatic mammals"));
    assert!(extraction.content.content.contains("densest of any animal"));
    assert!(extraction.content.content.contains("shellfish"));
}

#[test]
fn test_nothing_readable_gives_placeholder() {
    let html = "<html><head><script>var x = 1;</script></head><body><style>p{}</style></body></html>";
    let content = ContentExtractor::new().extract(html, "https://example.com/empty");

    assert_eq!(content.content, PLACEHOLDER_CONTENT);
    assert_eq!(content.title, "Untitled");
}

#[test]
fn test_malformed_html_does_not_panic() {
    for html in [
        "",
        "<<<>>>",
        "<html><body><div><p>Unclosed paragraph with enough text to count",
        "<p>\u{1F98A} emoji text that is long enough to keep around</p>",
    ] {
        let content = ContentExtractor::new().extract(html, "about:blank");
        assert!(!content.content.is_empty());
        assert!(content.content.chars().count() <= MAX_CONTENT_CHARS + 3);
    }
}
