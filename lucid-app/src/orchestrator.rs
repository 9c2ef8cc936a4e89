//! One request, end to end: acquire, extract, refine, shape the result.
use crate::error::ServiceError;
use futures::Stream;
use lucid_acquire::Acquirer;
use lucid_common::{FinalResult, LucidConfig, ProgressEvent, truncate_chars};
use lucid_extract::{ExtractionChain, PageInput};
use lucid_llm::refiner::ContentRefiner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Body of both extraction endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub url: String,
    /// Accepted for compatibility; images are never returned.
    #[serde(default)]
    pub keep_images: bool,
    #[serde(default)]
    pub language: Option<String>,
}

impl ExtractRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            keep_images: false,
            language: None,
        }
    }
}

/// Absolute http(s) URL or [`ServiceError::InvalidUrl`].
pub fn parse_url(raw: &str) -> Result<Url, ServiceError> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
        _ => Err(ServiceError::InvalidUrl(raw.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub default_language: String,
    /// Content shorter than this fails the request.
    pub viable_length: usize,
    pub max_content_length: Option<usize>,
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &LucidConfig) -> Self {
        Self {
            default_language: cfg.extraction.default_language.clone(),
            viable_length: cfg.extraction.viable_length,
            max_content_length: cfg.server.max_content_length,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&LucidConfig::default())
    }
}

/// Progress sink; remembers the last percentage so errors never go backwards.
struct Reporter {
    tx: Option<mpsc::Sender<ProgressEvent>>,
    last: u8,
}

impl Reporter {
    fn silent() -> Self {
        Self { tx: None, last: 0 }
    }

    fn streaming(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx: Some(tx), last: 0 }
    }

    async fn emit(&mut self, event: ProgressEvent) {
        self.last = self.last.max(event.progress);
        if let Some(tx) = &self.tx {
            // receiver gone means the client left; cancellation handles the rest
            let _ = tx.send(event).await;
        }
    }
}

pub struct Orchestrator {
    acquirer: Arc<dyn Acquirer>,
    extractor: ExtractionChain,
    refiner: Option<Arc<ContentRefiner>>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        acquirer: Arc<dyn Acquirer>,
        extractor: ExtractionChain,
        refiner: Option<ContentRefiner>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            acquirer,
            extractor,
            refiner: refiner.map(Arc::new),
            settings,
        }
    }

    pub fn refinement_enabled(&self) -> bool {
        self.refiner.is_some()
    }

    /// Synchronous mode: the final result or the first fatal error.
    pub async fn handle(
        &self,
        request: ExtractRequest,
        cancel: &CancellationToken,
    ) -> Result<FinalResult, ServiceError> {
        let span = request_span(&request);
        self.run(&request, cancel, &mut Reporter::silent())
            .instrument(span)
            .await
    }

    /// Streaming mode: progress events ending in exactly one `done` or
    /// `error`.
    ///
    /// The work runs on its own task. Dropping the stream cancels `cancel`,
    /// which stops that task at its next await point.
    pub fn stream(
        self: Arc<Self>,
        request: ExtractRequest,
        cancel: CancellationToken,
    ) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        let (tx, mut rx) = mpsc::channel(8);
        let worker_cancel = cancel.clone();
        let span = request_span(&request);

        tokio::spawn(
            async move {
                let mut reporter = Reporter::streaming(tx);
                let terminal = match self.run(&request, &worker_cancel, &mut reporter).await {
                    Ok(result) => ProgressEvent::done(result),
                    Err(err) => {
                        tracing::warn!(target: "app.request", error = %err, "request.failed");
                        ProgressEvent::error(reporter.last, err.to_string())
                    }
                };
                reporter.emit(terminal).await;
            }
            .instrument(span),
        );

        let guard = cancel.drop_guard();
        async_stream::stream! {
            let _guard = guard;
            while let Some(event) = rx.recv().await {
                let terminal = event.is_terminal();
                yield event;
                if terminal {
                    break;
                }
            }
        }
    }

    async fn run(
        &self,
        request: &ExtractRequest,
        cancel: &CancellationToken,
        progress: &mut Reporter,
    ) -> Result<FinalResult, ServiceError> {
        let url = parse_url(&request.url)?;

        progress.emit(ProgressEvent::crawling()).await;
        let fetched = self.acquirer.acquire(&url, cancel).await?;
        tracing::info!(
            target: "app.request",
            provenance = %fetched.provenance,
            html_len = fetched.html.len(),
            "request.acquired"
        );
        let from_archive = fetched.is_archived();
        if from_archive {
            progress.emit(ProgressEvent::archive_notice()).await;
        }

        progress.emit(ProgressEvent::parsing()).await;
        let language = request
            .language
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_language.clone());
        let document_type = self.extractor.document_type(fetched.html.clone()).await;
        let page = PageInput::new(fetched.html, url.as_str(), language);
        let candidate = self.extractor.extract(page, cancel).await;
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }

        let mut content = candidate.content.trim().to_string();
        let chars = content.chars().count();
        if chars < self.settings.viable_length {
            return Err(ServiceError::Unparseable { chars });
        }

        if let Some(refiner) = self.refiner.as_ref().filter(|r| r.should_refine(&content)) {
            progress.emit(ProgressEvent::ai_processing()).await;
            content = refine_detached(Arc::clone(refiner), content, cancel).await?;
        }

        if let Some(max) = self.settings.max_content_length {
            content = truncate_chars(&content, max).to_string();
        }

        tracing::info!(
            target: "app.request",
            strategy = %candidate.strategy,
            chars = content.chars().count(),
            from_archive,
            "request.done"
        );
        Ok(FinalResult {
            title: candidate.title,
            content,
            source_url: request.url.clone(),
            from_archive,
            document_type,
        })
    }
}

/// Refinement on its own task; a crashed task keeps the original text.
async fn refine_detached(
    refiner: Arc<ContentRefiner>,
    content: String,
    cancel: &CancellationToken,
) -> Result<String, ServiceError> {
    let input = content.clone();
    let mut task = tokio::spawn(async move { refiner.refine(&input).await });
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            task.abort();
            Err(ServiceError::Cancelled)
        }
        joined = &mut task => Ok(joined.unwrap_or_else(|err| {
            tracing::warn!(target: "llm.refine", error = %err, "refine.task.failed");
            content
        })),
    }
}

fn request_span(request: &ExtractRequest) -> tracing::Span {
    tracing::info_span!(
        "request",
        id = %uuid::Uuid::new_v4(),
        url = %request.url,
    )
}
