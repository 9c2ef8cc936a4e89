//! Last structured attempt: well-known content containers.
use crate::metadata::first_text;
use crate::strategy::HtmlStrategy;
use crate::text::element_text;
use crate::PageInput;
use lucid_common::{ExtractionCandidate, Strategy};
use scraper::{Html, Selector};

/// Tried in order; the first whose text is long enough wins.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    ".post-content",
    ".entry-content",
];

pub struct SelectorStrategy {
    min_chars: usize,
}

impl SelectorStrategy {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl HtmlStrategy for SelectorStrategy {
    fn kind(&self) -> Strategy {
        Strategy::RawSelector
    }

    fn min_chars(&self) -> usize {
        self.min_chars
    }

    fn parse(&self, page: &PageInput) -> Option<ExtractionCandidate> {
        let doc = Html::parse_document(&page.html);
        let content = CONTENT_SELECTORS.iter().find_map(|css| {
            let selector = Selector::parse(css).ok()?;
            let el = doc.select(&selector).next()?;
            let text = element_text(el);
            (text.chars().count() > self.min_chars).then_some(text)
        })?;
        let title = first_text(&doc, "h1")
            .or_else(|| first_text(&doc, "title"))
            .unwrap_or_default();
        Some(ExtractionCandidate::new(title, content, Strategy::RawSelector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Option<ExtractionCandidate> {
        SelectorStrategy::new(200).parse(&PageInput::new(html, "https://example.com", "ko"))
    }

    #[test]
    fn first_long_container_wins() {
        let body = "x".repeat(250);
        let html = format!(
            "<title>Doc</title><main>{short}</main><div class=\"entry-content\">{body}</div>",
            short = "too short",
        );
        let c = run(&html).unwrap();
        assert_eq!(c.content, body);
        assert_eq!(c.title, "Doc");
    }

    #[test]
    fn h1_beats_title_and_short_pages_fail() {
        let html = format!("<title>T</title><h1> Head </h1><article>{}</article>", "y".repeat(201));
        assert_eq!(run(&html).unwrap().title, "Head");
        assert!(run("<article>short</article>").is_none());
    }
}
