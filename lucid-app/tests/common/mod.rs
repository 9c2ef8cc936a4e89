#![allow(dead_code)]

use async_trait::async_trait;
use lucid_acquire::{AcquireError, Acquirer, TierFailure};
use lucid_app::{Orchestrator, OrchestratorSettings};
use lucid_common::{FetchResult, Provenance, RefinementConfig};
use lucid_extract::structural::SelectorStrategy;
use lucid_extract::{ExtractionChain, Offload};
use lucid_llm::refiner::ContentRefiner;
use lucid_llm::traits::{LlmClient, LlmResponse};
use lucid_runtime::BlockingPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use url::Url;

pub enum Outcome {
    Page(String, Provenance),
    Exhausted,
    /// Waits until cancelled.
    Hang,
}

pub struct FakeAcquirer {
    outcome: Outcome,
    pub saw_cancel: Arc<AtomicBool>,
}

impl FakeAcquirer {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            saw_cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Acquirer for FakeAcquirer {
    async fn acquire(
        &self,
        _url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, AcquireError> {
        match &self.outcome {
            Outcome::Page(html, provenance) => Ok(FetchResult::new(html.clone(), *provenance)),
            Outcome::Exhausted => Err(AcquireError::Exhausted {
                source: TierFailure::Blocked(lucid_acquire::BlockReason::Status(503)),
                archive: TierFailure::NoSnapshot,
            }),
            Outcome::Hang => {
                cancel.cancelled().await;
                self.saw_cancel.store(true, Ordering::SeqCst);
                Err(AcquireError::Cancelled)
            }
        }
    }
}

pub struct FixedLlm(pub &'static str);

#[async_trait]
impl LlmClient for FixedLlm {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> lucid_common::Result<LlmResponse> {
        Ok(LlmResponse {
            text: self.0.to_string(),
            model: Some("fixed".into()),
            tokens_used: None,
        })
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

/// A news page whose `<article>` holds `body`.
pub fn article_page(body: &str) -> String {
    format!(
        r#"<html><head><title>Site title</title><meta property="og:type" content="article"></head>
<body><h1>기사 제목</h1><article>{body}</article></body></html>"#
    )
}

pub fn refiner(reply: &'static str) -> ContentRefiner {
    ContentRefiner::new(Arc::new(FixedLlm(reply)), &RefinementConfig::default())
}

pub fn orchestrator(
    acquirer: FakeAcquirer,
    refiner: Option<ContentRefiner>,
    settings: OrchestratorSettings,
) -> Orchestrator {
    let chain = ExtractionChain::new(
        vec![Box::new(Offload::new(SelectorStrategy::new(100)))],
        BlockingPool::new(2),
    );
    Orchestrator::new(Arc::new(acquirer), chain, refiner, settings)
}
