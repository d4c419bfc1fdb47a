//! HTML content and link extraction
//!
//! Text extraction finds a best-guess main-content region, walks it while
//! skipping non-content elements, and collapses whitespace. Link extraction
//! resolves anchors against the page URL, keeps only same-site HTML
//! candidates, and normalizes them for the visited set.

use crate::url::{normalize_url, same_site};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose subtrees carry no page content
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "template",
];

/// Candidate selectors for the main content region, tried in order
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role='main']", "#content", "#main"];

/// Path extensions that never resolve to an HTML page
const SKIP_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".pdf", ".doc", ".docx", ".zip",
    ".tar", ".gz", ".mp3", ".mp4", ".webm", ".avi", ".css", ".js", ".json", ".xml", ".rss",
];

/// Extracts cleaned text content from an HTML document
///
/// Looks for a main-content region (falling back to the full body), skips
/// scripts, styles, navigation, headers, footers and asides, and collapses
/// all whitespace runs to single spaces.
///
/// # Arguments
///
/// * `html` - The raw HTML document
///
/// # Returns
///
/// The cleaned text; empty when the document has no extractable content
///
/// # Example
///
/// ```
/// use site_radius::crawler::extract_text;
///
/// let html = "<html><body><nav>menu</nav><main>Hello   world</main></body></html>";
/// assert_eq!(extract_text(html), "Hello world");
/// ```
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    if let Some(root) = content_root(&document) {
        collect_text(root, &mut raw);
    }

    // Collapse whitespace runs (including newlines) to single spaces
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picks the element to extract text from
///
/// The first matching content selector wins; otherwise the body; otherwise
/// the document root (fragment without a body).
fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                return Some(element);
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            return Some(body);
        }
    }

    Some(document.root_element())
}

/// Appends the text of an element's subtree, skipping non-content elements
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !NON_CONTENT_TAGS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        } else if let Node::Text(text) = child.value() {
            out.push(' ');
            out.push_str(&text.text);
        }
    }
}

/// Extracts same-site links from an HTML document
///
/// Anchors are resolved against `base`, filtered to the seed's site, stripped
/// of known binary/media extensions, normalized, and deduplicated within the
/// page. The frontier performs the cross-page dedup.
///
/// # Arguments
///
/// * `html` - The raw HTML document
/// * `base` - The URL the document was fetched from (for relative links)
/// * `seed` - The crawl's seed URL (defines the site boundary)
pub fn extract_links(html: &str, base: &Url, seed: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            // Download links point at files, not pages
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let Some(resolved) = resolve_link(href, base) else {
                continue;
            };

            if !same_site(seed, &resolved) {
                continue;
            }

            if has_skipped_extension(resolved.path()) {
                continue;
            }

            let Ok(normalized) = normalize_url(resolved.as_str()) else {
                continue;
            };

            if seen.insert(normalized.as_str().to_string()) {
                links.push(normalized);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - invalid or non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same-page anchors
    if href.starts_with('#') {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Checks whether a URL path ends in a known non-HTML extension
fn has_skipped_extension(path: &str) -> bool {
    let lower = path.to_lowercase();
    SKIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
