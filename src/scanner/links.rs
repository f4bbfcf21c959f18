//! Content link extraction
//!
//! Pulls same-site links out of a storefront homepage so the scanner can
//! sweep a handful of content pages for provider signatures. Only links
//! into the storefront's content sections are kept; cart, account, and
//! checkout surfaces never carry useful provider traces.

use scraper::{Html, Selector};

/// Path segments that mark a storefront content section
const CONTENT_SECTIONS: &[&str] = &["/collections/", "/pages/", "/products/", "/blogs/"];

/// Maximum anchors collected from one page before prioritization
const EXTRACTION_CAP: usize = 25;

/// Extracts same-site content links from a homepage body
///
/// # Link Extraction Rules
///
/// **Include:**
/// - Root-relative hrefs (`/collections/...`) pointing into a content
///   section, expanded to `<scheme>://<domain><path>`
/// - Absolute hrefs that mention the domain and point into a content
///   section
///
/// **Exclude:**
/// - Protocol-relative hrefs (`//cdn...`)
/// - Links outside the content sections
/// - Off-site links
///
/// Query strings are stripped and duplicates dropped while preserving
/// document order.
pub fn extract_content_links(html: &str, domain: &str, scheme: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(link) = content_link(href, domain, scheme) {
                    if !links.contains(&link) {
                        links.push(link);
                    }
                }
            }
        }
    }

    links.truncate(EXTRACTION_CAP);
    links
}

/// Orders extracted links for scanning and caps the count
///
/// `/pages/` and `/collections/` links are moved ahead of the rest;
/// informational pages tend to carry the clearest provider markers.
/// Relative order within each group is preserved.
pub fn prioritize_scan_links(links: Vec<String>, limit: usize) -> Vec<String> {
    let (mut priority, rest): (Vec<String>, Vec<String>) = links
        .into_iter()
        .partition(|link| link.contains("/pages/") || link.contains("/collections/"));
    priority.extend(rest);
    priority.truncate(limit);
    priority
}

/// Label identifying a scanned page in reports: the link's path component
pub fn page_label(link: &str, domain: &str, scheme: &str) -> String {
    let prefix = format!("{}://{}", scheme, domain);
    match link.strip_prefix(&prefix) {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => link.to_string(),
    }
}

/// Validates one href and resolves it to an absolute content link
fn content_link(href: &str, domain: &str, scheme: &str) -> Option<String> {
    let href = href.trim();
    if !CONTENT_SECTIONS.iter().any(|section| href.contains(section)) {
        return None;
    }

    let trimmed = match href.find('?') {
        Some(query_start) => &href[..query_start],
        None => href,
    };

    if trimmed.starts_with('/') && !trimmed.starts_with("//") {
        Some(format!("{}://{}{}", scheme, domain, trimmed))
    } else if trimmed.contains(domain) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
