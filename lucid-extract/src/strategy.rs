//! The seam every extraction strategy plugs into.
use crate::PageInput;
use async_trait::async_trait;
use lucid_common::{ExtractionCandidate, Strategy};
use lucid_runtime::BlockingPool;
use std::sync::Arc;

/// Default acceptance threshold, in characters.
pub const DEFAULT_MIN_CHARS: usize = 100;

/// One way of pulling an article out of a page.
///
/// Returning `None` means "no usable candidate"; the chain moves on. A
/// candidate is accepted only when its content is longer than
/// [`min_chars`](ExtractionStrategy::min_chars).
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> Strategy;

    fn min_chars(&self) -> usize {
        DEFAULT_MIN_CHARS
    }

    async fn extract(
        &self,
        page: Arc<PageInput>,
        pool: &BlockingPool,
    ) -> Option<ExtractionCandidate>;
}

/// A strategy that is pure CPU work over the page HTML.
pub trait HtmlStrategy: Send + Sync + 'static {
    fn kind(&self) -> Strategy;

    fn min_chars(&self) -> usize {
        DEFAULT_MIN_CHARS
    }

    fn parse(&self, page: &PageInput) -> Option<ExtractionCandidate>;
}

/// Runs an [`HtmlStrategy`] on the blocking pool so parsing never stalls
/// the async workers. Panics inside `parse` become `None`.
pub struct Offload<S> {
    inner: Arc<S>,
}

impl<S: HtmlStrategy> Offload<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<S: HtmlStrategy> ExtractionStrategy for Offload<S> {
    fn kind(&self) -> Strategy {
        self.inner.kind()
    }

    fn min_chars(&self) -> usize {
        self.inner.min_chars()
    }

    async fn extract(
        &self,
        page: Arc<PageInput>,
        pool: &BlockingPool,
    ) -> Option<ExtractionCandidate> {
        let inner = Arc::clone(&self.inner);
        match pool.run(move || inner.parse(&page)).await {
            Ok(candidate) => candidate,
            Err(err) => {
                tracing::warn!(
                    target: "extract.chain",
                    strategy = %self.inner.kind(),
                    error = %err,
                    "strategy.failed"
                );
                None
            }
        }
    }
}
