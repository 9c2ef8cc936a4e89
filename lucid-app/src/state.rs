//! Wiring: configuration in, shared request state out.
use crate::orchestrator::{Orchestrator, OrchestratorSettings};
use anyhow::{Context, Result};
use lucid_acquire::AcquisitionPipeline;
use lucid_common::LucidConfig;
use lucid_extract::ExtractionChain;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cheap to clone; one per router.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Parent of every per-request token; fires on shutdown.
    pub shutdown: Arc<CancellationToken>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, shutdown: Arc<CancellationToken>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            shutdown,
        }
    }
}

pub fn build_from_config(cfg: &LucidConfig, shutdown: Arc<CancellationToken>) -> Result<AppState> {
    let acquirer = AcquisitionPipeline::from_config(&cfg.acquisition)
        .context("building acquisition pipeline")?;
    let extractor = ExtractionChain::with_default_http(&cfg.extraction)
        .context("building extraction chain")?;

    let refiner = lucid_llm::build_refiner(&cfg.refinement);
    match &refiner {
        Some(_) => tracing::info!(model = %cfg.refinement.model, "refine.enabled"),
        None => tracing::info!("refine.disabled (no usable auth token)"),
    }
    tracing::info!(
        rendered = cfg.acquisition.rendered.enabled,
        archive = cfg.acquisition.archive.enabled,
        "acquire.tiers"
    );

    let orchestrator = Orchestrator::new(
        Arc::new(acquirer),
        extractor,
        refiner,
        OrchestratorSettings::from_config(cfg),
    );
    Ok(AppState::new(orchestrator, shutdown))
}
