//! Content-finding strategies, tried in order by the extractor.
//!
//! Every strategy returns `None` when it cannot find anything useful, so
//! the extractor can fall through to the next one.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::text::{collapse_whitespace, is_hidden_tag, text_len, visible_text};

/// Semantic regions, probed first
const SEMANTIC_SELECTORS: &[&str] = &["article", "main", "[role=\"main\"]"];

/// Common CMS content containers
const CONTENT_SELECTORS: &[&str] = &[
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".main-content",
    "#content",
    "#main-content",
];

/// News and blog layouts
const NEWS_SELECTORS: &[&str] = &[
    ".story-body",
    ".article-body",
    ".post-body",
    ".blog-post",
    ".news-article",
    ".entry",
    ".post",
];

/// class/id tokens marking navigation, ads and other chrome
const EXCLUDED_TOKENS: &[&str] = &[
    "nav",
    "navbar",
    "navigation",
    "menu",
    "header",
    "footer",
    "sidebar",
    "ad",
    "ads",
    "advert",
    "advertisement",
    "banner",
    "comment",
    "comments",
    "social",
    "share",
    "cookie",
    "popup",
    "modal",
    "related",
    "widget",
    "promo",
];

/// Subtrees ignored by the density strategy
const DENSITY_SKIP_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];

/// Minimum readability score for a candidate
pub const MIN_READABILITY_SCORE: f64 = 50.0;

/// Minimum accumulated text for the density winner
pub const MIN_DENSITY_CHARS: usize = 200;

/// Paragraphs at or below this length are ignored by the fallback
pub const MIN_PARAGRAPH_CHARS: usize = 20;

/// Characters of raw page text used as the last resort
pub const PAGE_TEXT_CHARS: usize = 2000;

/// Which strategy produced the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Structural,
    Readability,
    Density,
    Paragraphs,
    PageText,
    Placeholder,
}

/// Probe semantic, CMS and news selectors; first non-blank match wins
pub fn structural(doc: &Html) -> Option<String> {
    SEMANTIC_SELECTORS
        .iter()
        .chain(CONTENT_SELECTORS)
        .chain(NEWS_SELECTORS)
        .find_map(|selector| {
            let selector = Selector::parse(selector).ok()?;
            let element = doc.select(&selector).next()?;
            let text = visible_text(element);
            if text.trim().is_empty() {
                None
            } else {
                Some(text)
            }
        })
}

/// Readability-style score for a candidate block
pub fn readability_score(text_len: usize, paragraph_count: usize, link_density: f64) -> f64 {
    0.5 * text_len as f64 + 10.0 * paragraph_count as f64 - 20.0 * link_density
}

/// Anchor-text length divided by total text length
pub fn link_density(element: ElementRef<'_>) -> f64 {
    let total = text_len(element);
    if total == 0 {
        return 0.0;
    }

    let Ok(anchors) = Selector::parse("a") else {
        return 0.0;
    };
    let link_len: usize = element.select(&anchors).map(text_len).sum();
    link_len as f64 / total as f64
}

fn is_excluded(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let attrs = [value.attr("class"), value.attr("id")];

    attrs.iter().flatten().any(|attr| {
        attr.to_lowercase()
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .any(|token| EXCLUDED_TOKENS.contains(&token))
    })
}

/// Score every div/section/article and keep the best above the threshold
pub fn readability(doc: &Html) -> Option<String> {
    let candidates = Selector::parse("div, section, article").ok()?;
    let paragraphs = Selector::parse("p").ok()?;

    let mut best: Option<(f64, ElementRef<'_>)> = None;

    for element in doc.select(&candidates) {
        if is_excluded(element) {
            continue;
        }

        let length = text_len(element);
        if length == 0 {
            continue;
        }

        let paragraph_count = element.select(&paragraphs).count();
        let score = readability_score(length, paragraph_count, link_density(element));

        if score <= MIN_READABILITY_SCORE {
            continue;
        }
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, element));
        }
    }

    best.map(|(_, element)| visible_text(element))
}

fn body(doc: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|selector| doc.select(&selector).next())
        .unwrap_or_else(|| doc.root_element())
}

/// Push text lengths from each leaf element up into its ancestors below
/// `body`; densest ancestor wins
pub fn density(doc: &Html) -> Option<String> {
    let body = body(doc);
    let body_id = body.id();

    // Insertion order keeps ties deterministic: the deepest element wins.
    let mut totals: Vec<(NodeId, usize)> = Vec::new();
    let mut index: HashMap<NodeId, usize> = HashMap::new();

    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let length = text.trim().chars().count();
        if length == 0 {
            continue;
        }

        let skipped = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().map_or(false, |el| {
                is_hidden_tag(el.name()) || DENSITY_SKIP_TAGS.contains(&el.name())
            })
        });
        if skipped {
            continue;
        }

        // Start above the leaf element
        let mut parent = node.parent().and_then(|leaf| leaf.parent());
        while let Some(ancestor) = parent {
            if ancestor.id() == body_id {
                break;
            }
            if ancestor.value().is_element() {
                match index.get(&ancestor.id()) {
                    Some(&slot) => totals[slot].1 += length,
                    None => {
                        index.insert(ancestor.id(), totals.len());
                        totals.push((ancestor.id(), length));
                    }
                }
            }
            parent = ancestor.parent();
        }
    }

    let mut best: Option<(NodeId, usize)> = None;
    for &(id, total) in &totals {
        if best.map_or(true, |(_, top)| total > top) {
            best = Some((id, total));
        }
    }

    let (id, total) = best?;
    if total <= MIN_DENSITY_CHARS {
        return None;
    }

    let node = doc.tree.get(id)?;
    ElementRef::wrap(node).map(visible_text)
}

/// Every paragraph longer than the minimum, joined with spaces
pub fn paragraphs(doc: &Html) -> Option<String> {
    let selector = Selector::parse("p").ok()?;

    let texts: Vec<String> = doc
        .select(&selector)
        .map(|p| collapse_whitespace(&visible_text(p)))
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join(" "))
    }
}

/// First characters of the whole page's visible text
pub fn page_text(doc: &Html) -> Option<String> {
    let text = collapse_whitespace(&visible_text(body(doc)));
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(PAGE_TEXT_CHARS).collect())
}
