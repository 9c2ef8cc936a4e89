use crate::archive::{SnapshotArchive, WaybackArchive};
use crate::blocking::BlockDetector;
use crate::error::{AcquireError, TierFailure};
use crate::rendered::{Renderer, WebDriverRenderer};
use crate::static_tier::{HttpStaticFetcher, StaticFetcher};
use async_trait::async_trait;
use lucid_common::{AcquisitionConfig, FetchResult, Provenance};
use lucid_http::{HttpClient, HttpError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Anything that can turn a URL into HTML with provenance.
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, AcquireError>;
}

/// Time allowed per tier.
#[derive(Debug, Clone, Copy)]
pub struct TierBudgets {
    pub static_tier: Duration,
    pub rendered: Duration,
    pub archive: Duration,
}

impl TierBudgets {
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self {
            static_tier: config.static_timeout(),
            rendered: config.rendered_timeout(),
            archive: config.archive_timeout(),
        }
    }
}

/// STATIC -> RENDERED -> ARCHIVED, cheapest first, never backtracking.
pub struct AcquisitionPipeline {
    static_tier: Arc<dyn StaticFetcher>,
    renderer: Option<Arc<dyn Renderer>>,
    archive: Option<Arc<dyn SnapshotArchive>>,
    detector: BlockDetector,
    budgets: TierBudgets,
    static_success_length: usize,
}

impl AcquisitionPipeline {
    pub fn new(
        static_tier: Arc<dyn StaticFetcher>,
        renderer: Option<Arc<dyn Renderer>>,
        archive: Option<Arc<dyn SnapshotArchive>>,
        config: &AcquisitionConfig,
    ) -> Self {
        Self {
            static_tier,
            renderer,
            archive,
            detector: BlockDetector::from_config(&config.blocking),
            budgets: TierBudgets::from_config(config),
            static_success_length: config.static_success_length,
        }
    }

    /// Wire the production tiers (reqwest, chromedriver, Wayback).
    pub fn from_config(config: &AcquisitionConfig) -> Result<Self, HttpError> {
        let budgets = TierBudgets::from_config(config);

        let static_http = HttpClient::unanchored()?
            .with_timeout(budgets.static_tier)
            .with_retries(0);
        let static_tier: Arc<dyn StaticFetcher> =
            Arc::new(HttpStaticFetcher::new(static_http, &config.evasion));

        let renderer: Option<Arc<dyn Renderer>> = config.rendered.enabled.then(|| {
            Arc::new(WebDriverRenderer::new(
                &config.rendered,
                &config.evasion,
                budgets.rendered,
            )) as Arc<dyn Renderer>
        });

        let archive: Option<Arc<dyn SnapshotArchive>> = if config.archive.enabled {
            let http = HttpClient::unanchored()?
                .with_timeout(budgets.archive)
                .with_retries(1);
            Some(Arc::new(WaybackArchive::new(
                http,
                config.archive.availability_endpoint.clone(),
            )))
        } else {
            None
        };

        Ok(Self::new(static_tier, renderer, archive, config))
    }

    async fn try_static(&self, url: &Url, cancel: &CancellationToken) -> Result<String, TierFailure> {
        let page = bounded(self.budgets.static_tier, cancel, self.static_tier.fetch(url)).await?;
        if let Some(reason) = self.detector.check(page.status, &page.body) {
            return Err(TierFailure::Blocked(reason));
        }
        let chars = page.body.chars().count();
        if chars <= self.static_success_length {
            return Err(TierFailure::TooShort {
                chars,
                required: self.static_success_length,
            });
        }
        Ok(page.body)
    }

    async fn try_rendered(
        &self,
        renderer: &dyn Renderer,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, TierFailure> {
        // The renderer enforces the budget itself and returns only after its
        // session is gone.
        let html = renderer.render(url, cancel).await?;
        // A rendered document has no status of its own.
        if let Some(reason) = self.detector.check(200, &html) {
            return Err(TierFailure::Blocked(reason));
        }
        Ok(html)
    }

    async fn try_archive(
        &self,
        archive: &dyn SnapshotArchive,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, TierFailure> {
        bounded(self.budgets.archive, cancel, archive.fetch_archived(url)).await
    }
}

#[async_trait]
impl Acquirer for AcquisitionPipeline {
    async fn acquire(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, AcquireError> {
        let started = Instant::now();

        let mut site_failure = match self.try_static(url, cancel).await {
            Ok(html) => {
                tracing::info!(
                    target: "acquire.static",
                    %url,
                    chars = html.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "static fetch succeeded"
                );
                return Ok(FetchResult::new(html, Provenance::Static));
            }
            Err(TierFailure::Cancelled) => return Err(AcquireError::Cancelled),
            Err(failure) => {
                tracing::info!(target: "acquire.static", %url, reason = %failure, "escalating");
                failure
            }
        };

        match &self.renderer {
            Some(renderer) => match self.try_rendered(renderer.as_ref(), url, cancel).await {
                Ok(html) => {
                    tracing::info!(
                        target: "acquire.rendered",
                        %url,
                        chars = html.chars().count(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "rendered fetch succeeded"
                    );
                    return Ok(FetchResult::new(html, Provenance::Rendered));
                }
                Err(TierFailure::Cancelled) => return Err(AcquireError::Cancelled),
                Err(failure) => {
                    tracing::info!(target: "acquire.rendered", %url, reason = %failure, "escalating");
                    site_failure = failure;
                }
            },
            None => tracing::debug!(target: "acquire.rendered", "tier disabled; skipping"),
        }

        let Some(archive) = &self.archive else {
            return Err(AcquireError::Exhausted {
                source: site_failure,
                archive: TierFailure::Disabled,
            });
        };

        match self.try_archive(archive.as_ref(), url, cancel).await {
            Ok(html) => {
                tracing::info!(
                    target: "acquire.archive",
                    %url,
                    chars = html.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "archived snapshot used"
                );
                Ok(FetchResult::new(html, Provenance::Archived))
            }
            Err(TierFailure::Cancelled) => Err(AcquireError::Cancelled),
            Err(failure) => {
                tracing::warn!(
                    target: "acquire.archive",
                    %url,
                    site = %site_failure,
                    archive = %failure,
                    "all tiers exhausted"
                );
                Err(AcquireError::Exhausted {
                    source: site_failure,
                    archive: failure,
                })
            }
        }
    }
}

/// Run one tier under its time budget, giving up early on cancellation.
async fn bounded<T, F>(budget: Duration, cancel: &CancellationToken, fut: F) -> Result<T, TierFailure>
where
    F: Future<Output = Result<T, TierFailure>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TierFailure::Cancelled),
        res = tokio::time::timeout(budget, fut) => res.unwrap_or(Err(TierFailure::Timeout(budget))),
    }
}
