//! Best-effort noise removal over extracted article text.
use crate::traits::LlmClient;
use lucid_common::{truncate_chars, RefinementConfig};
use std::sync::Arc;
use std::time::Instant;

const REFINE_INSTRUCTIONS: &str = "Remove only advertisements, reader comments, and related-article lists from the following text. Keep the article body exactly as written, in its original language, and return only the cleaned text.";

/// Wraps an [`LlmClient`] with the refinement prompt and its size limits.
///
/// `refine` never fails: any provider problem yields the input unchanged.
#[derive(Clone)]
pub struct ContentRefiner {
    client: Arc<dyn LlmClient + Send + Sync>,
    max_input_chars: usize,
    min_content_chars: usize,
    max_tokens: u32,
    temperature: f32,
}

impl ContentRefiner {
    pub fn new(client: Arc<dyn LlmClient + Send + Sync>, config: &RefinementConfig) -> Self {
        Self {
            client,
            max_input_chars: config.max_input_chars,
            min_content_chars: config.min_content_chars,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Content at or under the configured floor is passed through.
    pub fn should_refine(&self, content: &str) -> bool {
        content.chars().count() > self.min_content_chars
    }

    /// Only the first `max_input_chars` are sent; anything past that is
    /// appended to the refined head untouched.
    pub async fn refine(&self, content: &str) -> String {
        if !self.should_refine(content) {
            return content.to_string();
        }

        let head = truncate_chars(content, self.max_input_chars);
        let tail = &content[head.len()..];
        let prompt = format!("{REFINE_INSTRUCTIONS}\n\n{head}");
        let started = Instant::now();

        match self
            .client
            .generate(&prompt, None, Some(self.max_tokens), Some(self.temperature))
            .await
        {
            Ok(resp) => {
                let refined = resp.text.trim();
                if refined.is_empty() {
                    tracing::warn!(target: "llm.refine", "empty refinement; keeping original");
                    return content.to_string();
                }
                tracing::info!(
                    target: "llm.refine",
                    model = %self.client.model_name(),
                    input_chars = head.chars().count(),
                    output_chars = refined.chars().count(),
                    tail_chars = tail.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "refined"
                );
                let mut out = String::with_capacity(refined.len() + tail.len());
                out.push_str(refined);
                out.push_str(tail);
                out
            }
            Err(err) => {
                tracing::warn!(target: "llm.refine", error = %err, "refinement failed; keeping original");
                content.to_string()
            }
        }
    }
}
