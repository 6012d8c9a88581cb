//! Prefix-scoped link discovery: given a base URL and a rendered page, find
//! same-site links worth adding to the collection. Secondary to the main
//! fetch/extract path, used by `curio crawl --discover`-style flows.

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use url::Url;

const EXCLUDED_SCHEMES: &[&str] = &["javascript", "mailto", "tel"];

/// Anchors on `html` that are same-scheme, same-host as `base`, and whose
/// normalized path starts with `base`'s path (or all same-host links, if
/// `base`'s path is empty or `/`). Returns at most `max_pages` links, sorted
/// and deduplicated.
pub fn discover_links(html: &str, base: &str, max_pages: usize) -> Vec<String> {
    let Ok(base_url) = Url::parse(base) else { return vec![] };
    let base_prefix = normalize_path(base_url.path());
    let scoped_to_all = base_prefix.is_empty() || base_prefix == "/";

    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return vec![];
    };

    let mut found = BTreeSet::new();
    for el in doc.select(&selector) {
        let Some(href) = el.value().attr("href") else { continue };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(resolved) = base_url.join(href) else { continue };
        if EXCLUDED_SCHEMES.contains(&resolved.scheme()) {
            continue;
        }
        if resolved.scheme() != base_url.scheme() || resolved.host_str() != base_url.host_str() {
            continue;
        }
        let path = normalize_path(resolved.path());
        if !scoped_to_all && !path.starts_with(&base_prefix) {
            continue;
        }
        let mut normalized = resolved.clone();
        normalized.set_fragment(None);
        found.insert(normalized.to_string());
        if found.len() >= max_pages {
            break;
        }
    }
    found.into_iter().take(max_pages).collect()
}

/// Collapse a trailing slash: the empty path becomes `/`, `/foo/` becomes
/// `/foo`, and `/` stays `/`.
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path == "/" {
        return "/".to_string();
    }
    path.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_same_host_links_under_prefix() {
        let html = r#"
            <a href="/docs/a">a</a>
            <a href="/docs/b">b</a>
            <a href="/blog/c">c</a>
            <a href="https://other.com/docs/d">d</a>
        "#;
        let links = discover_links(html, "https://example.com/docs/", 10);
        assert_eq!(
            links,
            vec!["https://example.com/docs/a".to_string(), "https://example.com/docs/b".to_string()]
        );
    }

    #[test]
    fn excludes_javascript_and_mailto_and_fragments() {
        let html = r#"
            <a href="javascript:void(0)">js</a>
            <a href="mailto:a@example.com">mail</a>
            <a href="#section">frag</a>
            <a href="/real">real</a>
        "#;
        let links = discover_links(html, "https://example.com/", 10);
        assert_eq!(links, vec!["https://example.com/real".to_string()]);
    }

    #[test]
    fn respects_max_pages_cap() {
        let html = r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#;
        let links = discover_links(html, "https://example.com/", 2);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn empty_base_path_scopes_to_whole_host() {
        let html = r#"<a href="/anything/here">x</a>"#;
        let links = discover_links(html, "https://example.com", 10);
        assert_eq!(links, vec!["https://example.com/anything/here".to_string()]);
    }
}
