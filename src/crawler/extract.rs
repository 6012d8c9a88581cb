//! Pull title/description/content out of rendered HTML. Each field tries a
//! short list of selectors in order and takes the first non-empty match,
//! since real pages are inconsistent about which of these they bother to
//! set.

use scraper::{Html, Selector};

/// Content longer than this is truncated, with `"..."` appended, so a single
/// enormous page can't dominate `search_text` or blow up storage.
pub const MAX_CONTENT_CHARS: usize = 50_000;

const TITLE_SELECTORS: &[&str] = &["title", "h1"];
const DESCRIPTION_SELECTORS: &[&str] = &["meta[name='description']", "meta[property='og:description']"];
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    ".content",
    ".post-content",
    ".article-content",
    "#content",
    ".markdown-body",
    ".prose",
];

#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: String,
}

pub fn extract(html: &str, _url: &str) -> Extracted {
    let doc = Html::parse_document(html);
    let content = first_text_match(&doc, CONTENT_SELECTORS).or_else(|| first_text_match(&doc, &["body"]));
    Extracted {
        title: first_text_match(&doc, TITLE_SELECTORS),
        description: first_attr_match(&doc, DESCRIPTION_SELECTORS, "content"),
        content: truncate(&content.unwrap_or_default()),
    }
}

fn first_text_match(doc: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else { continue };
        if let Some(el) = doc.select(&selector).next() {
            let text: String = el.text().collect::<Vec<_>>().join(" ");
            let text = normalize_whitespace(&text);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn first_attr_match(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else { continue };
        if let Some(el) = doc.select(&selector).next() {
            if let Some(value) = el.value().attr(attr) {
                let value = normalize_whitespace(value);
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(content: &str) -> String {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_from_title_tag() {
        let html = "<html><head><title>Hello</title></head><body></body></html>";
        let e = extract(html, "https://example.com");
        assert_eq!(e.title.as_deref(), Some("Hello"));
    }

    #[test]
    fn falls_back_to_h1_when_title_missing() {
        let html = "<html><body><h1>Heading</h1></body></html>";
        let e = extract(html, "https://example.com");
        assert_eq!(e.title.as_deref(), Some("Heading"));
    }

    #[test]
    fn extracts_description_from_meta_tag() {
        let html = r#"<html><head><meta name="description" content="a page about rust"></head></html>"#;
        let e = extract(html, "https://example.com");
        assert_eq!(e.description.as_deref(), Some("a page about rust"));
    }

    #[test]
    fn falls_back_to_og_description() {
        let html = r#"<html><head><meta property="og:description" content="og desc"></head></html>"#;
        let e = extract(html, "https://example.com");
        assert_eq!(e.description.as_deref(), Some("og desc"));
    }

    #[test]
    fn prefers_article_content_over_body() {
        let html = "<html><body><article>Main text</article><p>other</p></body></html>";
        let e = extract(html, "https://example.com");
        assert_eq!(e.content, "Main text");
    }

    #[test]
    fn truncates_long_content() {
        let long = "a".repeat(MAX_CONTENT_CHARS + 100);
        let html = format!("<html><body>{long}</body></html>");
        let e = extract(&html, "https://example.com");
        assert!(e.content.ends_with("..."));
        assert_eq!(e.content.len(), MAX_CONTENT_CHARS + 3);
    }
}
