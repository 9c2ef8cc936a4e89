//! Article extraction: an ordered chain of strategies over fetched HTML.
//!
//! ```no_run
//! # async fn demo() -> Result<(), lucid_http::HttpError> {
//! use lucid_extract::{ExtractionChain, PageInput};
//! use tokio_util::sync::CancellationToken;
//!
//! let chain = ExtractionChain::with_default_http(&Default::default())?;
//! let page = PageInput::new("<article>…</article>", "https://example.com/a", "ko");
//! let candidate = chain.extract(page, &CancellationToken::new()).await;
//! println!("{} via {}", candidate.title, candidate.strategy);
//! # Ok(()) }
//! ```
pub mod boilerplate;
pub mod chain;
pub mod fallback;
pub mod metadata;
pub mod news;
pub mod readability;
pub mod strategy;
pub mod structural;
pub mod text;
pub mod trafilatura;

pub use chain::ExtractionChain;
pub use fallback::FALLBACK_TITLE;
pub use metadata::{PageMetadata, detect_document_type};
pub use news::{ArticleFetcher, HttpArticleFetcher, NewsFetchError};
pub use strategy::{ExtractionStrategy, HtmlStrategy, Offload};
pub use trafilatura::TrafilaturaStrategy;

/// What every strategy gets to look at.
#[derive(Debug, Clone)]
pub struct PageInput {
    pub html: String,
    /// Requested URL; the news strategy downloads it again.
    pub url: String,
    /// Language tag used for stopword scoring, e.g. `ko` or `en`.
    pub language: String,
}

impl PageInput {
    pub fn new(
        html: impl Into<String>,
        url: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            html: html.into(),
            url: url.into(),
            language: language.into(),
        }
    }
}
