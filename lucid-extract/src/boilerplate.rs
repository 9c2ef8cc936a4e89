//! Scraper-based main-text extraction, used by
//! [`crate::trafilatura::TrafilaturaStrategy`] when the trafilatura port
//! finds nothing.
//!
//! The content root is the first of `article`, `[itemprop=articleBody]`,
//! `main`, `[role=main]`, else `<body>`. Below it, navigation, comment
//! threads, sharing widgets, ads and link-heavy lists are dropped before the
//! text is collected. Tables are kept.
use crate::text::element_text_filtered;
use scraper::{ElementRef, Html, Selector};

const ROOTS: &[&str] = &["article", "[itemprop=articleBody]", "main", "[role=main]", "body"];

const CHROME_TAGS: &[&str] = &["nav", "footer", "aside", "header", "form", "button", "select"];

const CHROME_ROLES: &[&str] = &["navigation", "complementary", "contentinfo", "banner"];

/// Substrings of `class`/`id` that mark boilerplate containers.
const CHROME_MARKERS: &[&str] = &[
    "comment", "footer", "sidebar", "related", "share", "social", "advert", "banner", "cookie",
    "newsletter", "subscribe", "breadcrumb", "popup", "modal", "promo", "navbar", "menu",
];

/// Whole `class` tokens that mark ad slots; too short to match as substrings.
const AD_TOKENS: &[&str] = &["ad", "ads", "ad-slot", "adsbygoogle"];

const LINK_HEAVY_CONTAINERS: &[&str] = &["div", "section", "ul", "ol", "p", "table", "li"];

/// Boilerplate-free text of the document, `None` when nothing is left.
pub fn main_text(doc: &Html) -> Option<String> {
    let root = content_root(doc)?;
    let text = element_text_filtered(root, is_chrome);
    (!text.is_empty()).then_some(text)
}

fn content_root(doc: &Html) -> Option<ElementRef<'_>> {
    ROOTS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        doc.select(&selector)
            .find(|el| !el.text().all(|t| t.trim().is_empty()))
    })
}

fn is_chrome(el: &ElementRef<'_>) -> bool {
    let node = el.value();
    let name = node.name();
    if CHROME_TAGS.contains(&name) {
        return true;
    }
    if node.attr("hidden").is_some() || node.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(style) = node.attr("style") {
        let style: String = style.split_whitespace().collect::<String>().to_ascii_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }
    if node
        .attr("role")
        .is_some_and(|role| CHROME_ROLES.contains(&role.to_ascii_lowercase().as_str()))
    {
        return true;
    }

    let class = node.attr("class").unwrap_or_default().to_ascii_lowercase();
    let id = node.attr("id").unwrap_or_default().to_ascii_lowercase();
    if CHROME_MARKERS
        .iter()
        .any(|marker| class.contains(marker) || id.contains(marker))
    {
        return true;
    }
    if class
        .split_whitespace()
        .chain(std::iter::once(id.as_str()))
        .any(|token| AD_TOKENS.contains(&token))
    {
        return true;
    }

    LINK_HEAVY_CONTAINERS.contains(&name) && is_link_heavy(el)
}

/// More than half of a short container's text sits inside links.
fn is_link_heavy(el: &ElementRef<'_>) -> bool {
    let Ok(links) = Selector::parse("a") else {
        return false;
    };
    let text_chars = char_count(el);
    if text_chars == 0 || text_chars >= 1000 {
        return false;
    }
    let link_chars: usize = el.select(&links).map(|a| char_count(&a)).sum();
    link_chars as f64 / text_chars as f64 > 0.5
}

fn char_count(el: &ElementRef<'_>) -> usize {
    el.text()
        .flat_map(|t| t.chars())
        .filter(|c| !c.is_whitespace())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Option<String> {
        main_text(&Html::parse_document(html))
    }

    #[test]
    fn drops_chrome_and_keeps_tables() {
        let html = r#"<html><head><meta property="og:title" content="Budget vote"></head><body>
            <nav><a href="/">Home</a><a href="/news">News</a></nav>
            <article>
              <p>The council approved the budget on Tuesday.</p>
              <div class="share-buttons">Share on X</div>
              <table><tr><td>Roads</td><td>40%</td></tr></table>
              <div class="ad">Buy now</div>
              <section id="comments"><p>First!</p></section>
              <ul><li><a href="/1">Other story one</a></li><li><a href="/2">Other story two</a></li></ul>
            </article>
            <footer>Copyright</footer></body></html>"#;
        assert_eq!(
            run(html).as_deref(),
            Some("The council approved the budget on Tuesday.\nRoads | 40%")
        );
    }

    #[test]
    fn falls_back_to_body_and_skips_hidden() {
        let html = r#"<body><div><p>Visible body text.</p>
            <p style="display: none">secret</p><p hidden>also secret</p></div></body>"#;
        assert_eq!(run(html).as_deref(), Some("Visible body text."));
    }

    #[test]
    fn empty_article_is_skipped_for_next_root() {
        let html = "<body><article> </article><main><p>Main text</p></main></body>";
        assert_eq!(run(html).as_deref(), Some("Main text"));
    }

    #[test]
    fn nothing_left_is_none() {
        assert!(run("<body><nav>menu</nav></body>").is_none());
    }
}
