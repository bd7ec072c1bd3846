use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// `href` attribute values. The inventory page lists every volume as an
/// `<a href>` pointing into the bucket; nothing else on the page matters.
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

/// Absolute form of `raw`, resolved against the page URL, fragment dropped.
fn resolve_href(raw: &str, base: Option<&url::Url>) -> Option<String> {
    let raw = raw.trim();
    let mut parsed = match url::Url::parse(raw) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(raw).ok()?,
        Err(_) => return None,
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// Every distinct `href` link on the page, in document order.
pub fn extract_all_links(html: &str, page_url: &str) -> Vec<String> {
    let base = url::Url::parse(page_url).ok();
    let mut seen = HashSet::new();

    HREF_RE
        .captures_iter(html)
        .filter_map(|cap| resolve_href(&cap[1], base.as_ref()))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Links containing `pattern`. An empty pattern keeps everything.
pub fn extract_links_by_pattern(html: &str, page_url: &str, pattern: &str) -> Vec<String> {
    extract_all_links(html, page_url)
        .into_iter()
        .filter(|link| pattern.is_empty() || link.contains(pattern))
        .collect()
}

/// Last path segment of a link, used as the on-disk file name.
pub fn file_name_of(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
