use async_trait::async_trait;
use lucid_common::Result;
use serde::{Deserialize, Serialize};

/// Completion text plus whatever usage the provider reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// A chat-style text model. Refinement only ever needs one turn.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One completion for `prompt`; `None` leaves the provider default.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    fn model_name(&self) -> &str;
}
