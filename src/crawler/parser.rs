//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a>` tags), resolved against the page or its `<base>`
//! - Page title

use crate::url::{canonicalize, is_asset_path, same_site};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Links found on the page
    pub links: PageLinks,
}

/// Where a link points, after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
enum LinkTarget {
    Internal(Url),
    External(Url),
}

/// The raw hrefs of one page, resolved on demand
///
/// Iterating [`PageLinks::internal`] resolves, filters and deduplicates lazily.
/// The sequence is finite and can be restarted by calling it again.
#[derive(Debug, Clone)]
pub struct PageLinks {
    base: Url,
    site: Url,
    hrefs: Vec<String>,
}

impl PageLinks {
    /// Canonical same-site page links, each at most once, in document order
    pub fn internal(&self) -> impl Iterator<Item = Url> + '_ {
        let mut seen = HashSet::new();
        self.hrefs
            .iter()
            .filter_map(move |href| match self.resolve(href) {
                Some(LinkTarget::Internal(url)) => Some(url),
                _ => None,
            })
            .filter(move |url| seen.insert(url.as_str().to_string()))
    }

    /// Number of distinct links leaving the site
    pub fn external_count(&self) -> usize {
        self.hrefs
            .iter()
            .filter_map(|href| match self.resolve(href) {
                Some(LinkTarget::External(url)) => Some(url.as_str().to_string()),
                _ => None,
            })
            .collect::<HashSet<_>>()
            .len()
    }

    /// Reclassifies the links against another site root
    pub(crate) fn rescope(&mut self, site: Url) {
        self.site = site;
    }

    /// Resolves one href
    ///
    /// Returns None if the link should be excluded:
    /// - javascript:, mailto:, tel:, data: schemes
    /// - fragment-only links
    /// - invalid URLs or non-HTTP(S) URLs after resolution
    /// - same-site links to static assets
    fn resolve(&self, href: &str) -> Option<LinkTarget> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let lower = href.to_ascii_lowercase();
        if lower.starts_with("javascript:")
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower.starts_with("data:")
        {
            return None;
        }

        let absolute = self.base.join(href).ok()?;
        let url = canonicalize(absolute).ok()?;

        if !same_site(&url, &self.site) {
            return Some(LinkTarget::External(url));
        }

        if is_asset_path(&url) {
            return None;
        }

        Some(LinkTarget::Internal(url))
    }
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The URL the page was served from
/// * `site` - Root of the crawled site; decides internal vs external
///
/// # Example
///
/// ```
/// use sumi_rank::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &page, &page);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links.internal().count(), 1);
/// ```
pub fn parse_html(html: &str, page_url: &Url, site: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let base = extract_base(&document, page_url).unwrap_or_else(|| page_url.clone());
    let hrefs = extract_hrefs(&document);

    ParsedPage {
        title,
        links: PageLinks {
            base,
            site: site.clone(),
            hrefs,
        },
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves the document's `<base href>`, if any
fn extract_base(document: &Html, page_url: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    page_url.join(href.trim()).ok()
}

/// Collects raw href values from anchors
fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
