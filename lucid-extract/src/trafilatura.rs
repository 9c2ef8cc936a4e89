//! First strategy in the chain: the `rs-trafilatura` port, with comment
//! sections excluded and tables kept.
//!
//! When the port errors or returns no text, the scraper heuristic in
//! [`crate::boilerplate`] gets a turn on the same document.
use crate::PageInput;
use crate::boilerplate::main_text;
use crate::metadata::PageMetadata;
use crate::strategy::HtmlStrategy;
use lucid_common::{ExtractionCandidate, Strategy};
use rs_trafilatura::{ExtractResult, Options, extract_with_options};
use scraper::Html;

pub struct TrafilaturaStrategy {
    min_chars: usize,
}

impl TrafilaturaStrategy {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    fn options(page: &PageInput) -> Options {
        Options {
            include_comments: false,
            include_tables: true,
            url: Some(page.url.clone()),
            // readability runs as its own strategy further down the chain
            // (rs-trafilatura 0.2.2 has no built-in readability fallback)
            ..Options::default()
        }
    }
}

impl HtmlStrategy for TrafilaturaStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Trafilatura
    }

    fn min_chars(&self) -> usize {
        self.min_chars
    }

    fn parse(&self, page: &PageInput) -> Option<ExtractionCandidate> {
        let extracted = extract_with_options(&page.html, &Self::options(page))
            .inspect_err(|err| {
                tracing::debug!(target: "extract.trafilatura", error = %err, "port found nothing");
            })
            .ok()
            .filter(|result| !result.content_text.trim().is_empty());

        let doc = Html::parse_document(&page.html);
        let page_title = || {
            PageMetadata::from_document(&doc)
                .title()
                .unwrap_or_default()
                .to_string()
        };

        let (title, content) = match extracted {
            Some(ExtractResult {
                content_text,
                metadata,
                ..
            }) => {
                let title = metadata
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(page_title);
                (title, content_text.trim().to_string())
            }
            None => (page_title(), main_text(&doc)?),
        };
        Some(ExtractionCandidate::new(title, content, Strategy::Trafilatura))
    }
}
