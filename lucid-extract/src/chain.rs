//! Ordered extraction with a fallback that always answers.
use crate::fallback::{FALLBACK_TITLE, fallback_text};
use crate::metadata::detect_document_type;
use crate::news::{HttpArticleFetcher, NewsStrategy};
use crate::readability::ReadabilityStrategy;
use crate::strategy::{ExtractionStrategy, Offload};
use crate::structural::SelectorStrategy;
use crate::trafilatura::TrafilaturaStrategy;
use crate::PageInput;
use lucid_common::{ExtractionCandidate, ExtractionConfig, Strategy};
use lucid_http::{HttpClient, HttpError};
use lucid_runtime::BlockingPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ExtractionChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    pool: BlockingPool,
}

impl ExtractionChain {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>, pool: BlockingPool) -> Self {
        Self { strategies, pool }
    }

    /// Trafilatura, news article, readability, structural selectors.
    pub fn from_config(cfg: &ExtractionConfig, http: HttpClient) -> Self {
        let fetcher = HttpArticleFetcher::new(http, Duration::from_secs(cfg.news_timeout_secs));
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(Offload::new(TrafilaturaStrategy::new(cfg.min_content_length))),
            Box::new(NewsStrategy::new(Arc::new(fetcher), cfg.min_content_length)),
            Box::new(Offload::new(ReadabilityStrategy::new(cfg.min_content_length))),
            Box::new(Offload::new(SelectorStrategy::new(cfg.selector_min_length))),
        ];
        Self::new(strategies, BlockingPool::new(cfg.blocking_workers))
    }

    /// Same as [`from_config`](Self::from_config) with a fresh HTTP client
    /// for the news fetch.
    pub fn with_default_http(cfg: &ExtractionConfig) -> Result<Self, HttpError> {
        Ok(Self::from_config(cfg, HttpClient::unanchored()?))
    }

    /// `news`, `blog` or `article` when the page declares itself as one.
    pub async fn document_type(&self, html: String) -> Option<String> {
        self.pool
            .run(move || detect_document_type(&html).map(str::to_string))
            .await
            .ok()
            .flatten()
    }

    /// First accepted candidate, else the whole-page fallback.
    ///
    /// Never fails. Cancellation skips the remaining strategies.
    pub async fn extract(&self, page: PageInput, cancel: &CancellationToken) -> ExtractionCandidate {
        let page = Arc::new(page);

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                out = strategy.extract(Arc::clone(&page), &self.pool) => Some(out),
            };
            let Some(candidate) = outcome else {
                tracing::debug!(target: "extract.chain", strategy = %kind, "extract.cancelled");
                break;
            };
            match candidate {
                Some(c) if c.content_chars() > strategy.min_chars() => {
                    tracing::info!(
                        target: "extract.chain",
                        strategy = %kind,
                        chars = c.content_chars(),
                        "extract.accepted"
                    );
                    return c;
                }
                Some(c) => tracing::debug!(
                    target: "extract.chain",
                    strategy = %kind,
                    chars = c.content_chars(),
                    required = strategy.min_chars(),
                    "extract.too_short"
                ),
                None => tracing::debug!(target: "extract.chain", strategy = %kind, "extract.none"),
            }
        }

        let html = page.html.clone();
        match self.pool.run(move || fallback_text(&html)).await {
            Ok(candidate) => {
                tracing::info!(
                    target: "extract.chain",
                    strategy = %Strategy::FallbackText,
                    chars = candidate.content_chars(),
                    "extract.fallback"
                );
                candidate
            }
            Err(err) => {
                tracing::warn!(target: "extract.chain", error = %err, "extract.fallback.failed");
                ExtractionCandidate::new(FALLBACK_TITLE, String::new(), Strategy::FallbackText)
            }
        }
    }
}
