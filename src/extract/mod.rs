//! Content extraction from HTML pages.
//!
//! The extractor runs an ordered fallback chain, first non-empty result
//! wins:
//! 1. Structural: semantic regions and well-known content selectors
//! 2. Readability: block scoring by text length, paragraphs and link density
//! 3. Density: the ancestor accumulating the most text
//! 4. Fallback: all reasonable paragraphs, else the raw page text
//!
//! Whatever is found is cleaned (whitespace, boilerplate) and capped at
//! [`MAX_CONTENT_CHARS`] characters.

pub mod strategies;
pub mod text;

use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use crate::domain::ExtractedContent;

pub use strategies::Strategy;
pub use text::{clean_content, ELLIPSIS, MAX_CONTENT_CHARS};

/// Returned when no strategy finds anything
pub const PLACEHOLDER_CONTENT: &str = "Unable to extract meaningful content from this page.";

const UNTITLED: &str = "Untitled";

/// Extraction result plus the strategy that produced it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub content: ExtractedContent,
    pub strategy: Strategy,
}

/// Heuristic main-content extractor
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract readable content from `html`. Never fails.
    pub fn extract(&self, html: &str, url: &str) -> ExtractedContent {
        self.extract_with_strategy(html, url).content
    }

    /// Extract and report which strategy fired
    #[instrument(skip(self, html), fields(bytes = html.len()))]
    pub fn extract_with_strategy(&self, html: &str, url: &str) -> Extraction {
        let doc = Html::parse_document(html);
        let title = page_title(&doc);

        let (raw, strategy) = find_content(&doc);
        let mut content = clean_content(&raw);

        let strategy = if content.is_empty() {
            warn!(%url, "No readable content found, using placeholder");
            content = PLACEHOLDER_CONTENT.to_string();
            Strategy::Placeholder
        } else {
            strategy
        };

        debug!(?strategy, chars = content.chars().count(), "Content extracted");

        Extraction {
            content: ExtractedContent::new(content, title, url),
            strategy,
        }
    }
}

fn find_content(doc: &Html) -> (String, Strategy) {
    let chain: [(Strategy, fn(&Html) -> Option<String>); 5] = [
        (Strategy::Structural, strategies::structural),
        (Strategy::Readability, strategies::readability),
        (Strategy::Density, strategies::density),
        (Strategy::Paragraphs, strategies::paragraphs),
        (Strategy::PageText, strategies::page_text),
    ];

    for (strategy, run) in chain {
        if let Some(found) = run(doc) {
            if !found.trim().is_empty() {
                return (found, strategy);
            }
        }
    }

    (String::new(), Strategy::Placeholder)
}

/// og:title, then <title>, then the first <h1>
fn page_title(doc: &Html) -> String {
    let probes: [(&str, Option<&str>); 3] = [
        ("meta[property=\"og:title\"]", Some("content")),
        ("title", None),
        ("h1", None),
    ];

    probes
        .iter()
        .find_map(|(selector, attr)| {
            let selector = Selector::parse(selector).ok()?;
            let element = doc.select(&selector).next()?;
            let raw = match attr {
                Some(name) => element.value().attr(name)?.to_string(),
                None => element.text().collect::<String>(),
            };
            let title = text::collapse_whitespace(&raw);
            (!title.is_empty()).then_some(title)
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}
