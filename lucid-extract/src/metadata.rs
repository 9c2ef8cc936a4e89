//! Page-level metadata: titles and the kind of document.
//!
//! Sources are `<meta>` tags (OpenGraph, Twitter cards), JSON-LD blocks
//! (including `@graph` arrays), and the `<title>` element.
use crate::text::inline_text;
use scraper::{Html, Selector};
use serde_json::Value;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub og_title: Option<String>,
    pub twitter_title: Option<String>,
    pub headline: Option<String>,
    pub html_title: Option<String>,
    pub og_type: Option<String>,
    /// `@type` values of every JSON-LD object, in document order.
    pub schema_types: Vec<String>,
}

impl PageMetadata {
    pub fn from_document(doc: &Html) -> Self {
        let (schema_types, headline) = json_ld(doc);
        Self {
            og_title: meta_content(doc, "og:title"),
            twitter_title: meta_content(doc, "twitter:title"),
            headline,
            html_title: first_text(doc, "title"),
            og_type: meta_content(doc, "og:type"),
            schema_types,
        }
    }

    /// Best title: `og:title`, `twitter:title`, JSON-LD headline, `<title>`.
    pub fn title(&self) -> Option<&str> {
        self.og_title
            .as_deref()
            .or(self.twitter_title.as_deref())
            .or(self.headline.as_deref())
            .or(self.html_title.as_deref())
    }

    /// `news`, `blog` or `article` when the page declares itself as one.
    pub fn document_type(&self) -> Option<&'static str> {
        const NEWS: &[&str] = &[
            "NewsArticle",
            "ReportageNewsArticle",
            "AnalysisNewsArticle",
            "OpinionNewsArticle",
            "BackgroundNewsArticle",
            "ReviewNewsArticle",
        ];
        const BLOG: &[&str] = &["BlogPosting", "LiveBlogPosting", "Blog"];
        const ARTICLE: &[&str] = &["Article", "ScholarlyArticle", "TechArticle", "Report"];

        let has = |set: &[&str]| self.schema_types.iter().any(|t| set.contains(&t.as_str()));
        if has(NEWS) {
            return Some("news");
        }
        if has(BLOG) {
            return Some("blog");
        }
        if has(ARTICLE) {
            return Some("article");
        }

        let og = self.og_type.as_deref()?.to_ascii_lowercase();
        if og.contains("news") {
            Some("news")
        } else if og.contains("blog") {
            Some("blog")
        } else if og == "article" {
            Some("article")
        } else {
            None
        }
    }
}

/// Document type of raw HTML, if it declares one.
///
/// ```
/// let html = r#"<script type="application/ld+json">
///   {"@context":"https://schema.org","@type":"NewsArticle","headline":"속보"}
/// </script>"#;
/// assert_eq!(lucid_extract::metadata::detect_document_type(html), Some("news"));
/// ```
pub fn detect_document_type(html: &str) -> Option<&'static str> {
    PageMetadata::from_document(&Html::parse_document(html)).document_type()
}

/// Drops a site name joined to the headline by a common separator.
///
/// ```
/// use lucid_extract::metadata::shorten_title;
/// assert_eq!(shorten_title("Rates rise again | Daily Ledger"), "Rates rise again");
/// assert_eq!(shorten_title("No separator here"), "No separator here");
/// ```
pub fn shorten_title(title: &str) -> String {
    const SEPARATORS: &[&str] = &[" | ", " - ", " :: ", " / ", " – ", " — ", " · "];
    let title = title.trim();
    for sep in SEPARATORS {
        if !title.contains(sep) {
            continue;
        }
        let longest = title
            .split(sep)
            .map(str::trim)
            .max_by_key(|part| part.chars().count())
            .unwrap_or(title);
        if longest.split_whitespace().count() >= 2 {
            return longest.to_string();
        }
    }
    title.to_string()
}

pub(crate) fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .next()
        .map(inline_text)
        .filter(|t| !t.is_empty())
}

fn meta_content(doc: &Html, key: &str) -> Option<String> {
    let selector = Selector::parse("meta").ok()?;
    doc.select(&selector).find_map(|m| {
        let el = m.value();
        let name = el.attr("property").or_else(|| el.attr("name"))?;
        if !name.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let content = el.attr("content")?.trim();
        (!content.is_empty()).then(|| content.to_string())
    })
}

fn json_ld(doc: &Html) -> (Vec<String>, Option<String>) {
    let mut types = Vec::new();
    let mut headline = None;
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return (types, headline);
    };
    for script in doc.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        let mut objects = Vec::new();
        flatten_objects(&value, &mut objects);
        for obj in objects {
            match obj.get("@type") {
                Some(Value::String(t)) => types.push(t.clone()),
                Some(Value::Array(ts)) => types.extend(
                    ts.iter().filter_map(|t| t.as_str()).map(str::to_string),
                ),
                _ => {}
            }
            if headline.is_none() {
                headline = obj
                    .get("headline")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string);
            }
        }
    }
    (types, headline)
}

fn flatten_objects<'a>(value: &'a Value, out: &mut Vec<&'a serde_json::Map<String, Value>>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| flatten_objects(v, out)),
        Value::Object(obj) => {
            out.push(obj);
            if let Some(graph) = obj.get("@graph") {
                flatten_objects(graph, out);
            }
        }
        _ => {}
    }
}
