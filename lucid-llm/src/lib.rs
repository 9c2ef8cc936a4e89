//! LLM integration for content refinement.
//!
//! This crate exposes a common [`traits::LlmClient`] interface, an
//! OpenAI-compatible chat client, and the [`refiner::ContentRefiner`] that
//! strips ads and comment sections from extracted text.
//!
//! # Examples
//! ```
//! use lucid_common::RefinementConfig;
//! use lucid_llm::build_refiner;
//!
//! // No usable token -> refinement is simply unavailable.
//! let cfg = RefinementConfig { auth_token: Some("${OPENAI_API_KEY}".into()), ..Default::default() };
//! assert!(build_refiner(&cfg).is_none());
//! ```
pub mod openai;
pub mod refiner;
pub mod traits;

use lucid_common::{LlmProvider, RefinementConfig};
use openai::OpenAiClient;
use refiner::ContentRefiner;
use std::sync::Arc;
use traits::LlmClient;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Build a provider client when a credential is configured.
pub fn build_client(config: &RefinementConfig) -> Option<Arc<dyn LlmClient + Send + Sync>> {
    let token = config.usable_token()?;
    let client = match config.provider {
        LlmProvider::OpenAi => OpenAiClient::from_config(token, config),
    };
    match client {
        Ok(c) => Some(Arc::new(c)),
        Err(err) => {
            tracing::warn!(target: "llm.setup", error = %err, "refinement client unavailable");
            None
        }
    }
}

/// The refinement capability, or `None` when no provider is usable.
pub fn build_refiner(config: &RefinementConfig) -> Option<ContentRefiner> {
    let client = build_client(config)?;
    tracing::info!(
        target: "llm.setup",
        model = %client.model_name(),
        "refinement enabled"
    );
    Some(ContentRefiner::new(client, config))
}
