//! Readability-style main-content isolation.
use crate::metadata::shorten_title;
use crate::strategy::HtmlStrategy;
use crate::text::fragment_to_text;
use crate::PageInput;
use dom_smoothie::{Config, Readability};
use lucid_common::{ExtractionCandidate, Strategy};

const MAX_ELEMENTS: usize = 9000;

pub struct ReadabilityStrategy {
    min_chars: usize,
}

impl ReadabilityStrategy {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl HtmlStrategy for ReadabilityStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Readability
    }

    fn min_chars(&self) -> usize {
        self.min_chars
    }

    fn parse(&self, page: &PageInput) -> Option<ExtractionCandidate> {
        let cfg = Config {
            max_elements_to_parse: MAX_ELEMENTS,
            ..Default::default()
        };
        let mut reader = Readability::new(page.html.as_str(), Some(page.url.as_str()), Some(cfg))
            .inspect_err(|err| tracing::debug!(target: "extract.readability", error = %err, "readability.init.failed"))
            .ok()?;
        let article = reader
            .parse()
            .inspect_err(|err| tracing::debug!(target: "extract.readability", error = %err, "readability.parse.failed"))
            .ok()?;

        // The summary is an HTML fragment; flatten it one line per block.
        let content = fragment_to_text(&article.content);
        if content.is_empty() {
            return None;
        }
        Some(ExtractionCandidate::new(
            shorten_title(&article.title),
            content,
            Strategy::Readability,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolates_article_body() {
        let para = "Scientists found a new species of frog in the rainforest this spring, \
                    and they described its unusual call in a paper published this week. ";
        let html = format!(
            "<html><head><title>Frog found - Science Daily</title></head><body>\
             <div class=\"menu\"><a href=\"/\">Home</a> <a href=\"/about\">About</a></div>\
             <article><h1>Frog found</h1><p>{}</p><p>{}</p><p>{}</p></article>\
             </body></html>",
            para.repeat(2),
            para.repeat(2),
            para.repeat(2)
        );
        let page = PageInput::new(html, "https://example.com/frog", "en");
        let candidate = ReadabilityStrategy::new(100).parse(&page).expect("candidate");
        assert_eq!(candidate.strategy, Strategy::Readability);
        assert!(candidate.content.contains("new species of frog"));
        assert!(!candidate.content.contains("About"));
        assert!(candidate.content.lines().count() >= 3);
    }
}
