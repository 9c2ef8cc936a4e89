use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use lucid_common::{LucidError, RefinementConfig, Result};
use lucid_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// OpenAI-compatible `chat/completions` client.
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    pub total_tokens: u32,
}

impl OpenAiClient {
    /// Create a client against the public endpoint.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = HttpClient::new(OPENAI_API_BASE).map_err(http_to_lucid)?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Create a client honoring the configured endpoint, model and timeout.
    /// Refinement is best-effort, so HTTP retries are disabled.
    pub fn from_config(api_key: &str, config: &RefinementConfig) -> Result<Self> {
        let endpoint = if config.endpoint.ends_with('/') {
            config.endpoint.clone()
        } else {
            format!("{}/", config.endpoint)
        };
        let client = HttpClient::new(&endpoint)
            .map_err(http_to_lucid)?
            .with_timeout(config.timeout())
            .with_retries(0);
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature,
        };

        let resp: ChatResponse = self
            .client
            .post_json_opts(
                "chat/completions",
                &req,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.api_key)),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_lucid)?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LucidError::Llm("response carried no choices".into()))?;

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_lucid(e: HttpError) -> LucidError {
    match e {
        HttpError::Timeout(_) => LucidError::Timeout,
        other => LucidError::Llm(other.to_string()),
    }
}
