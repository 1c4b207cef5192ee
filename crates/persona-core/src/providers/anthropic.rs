use crate::errors::ProviderError;
use crate::model::{ChatMessage, CompletionResult};
use crate::providers::{CompletionOptions, ProviderClient, RateLimiter};
use async_trait::async_trait;
use serde::Deserialize;

const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Anthropic Messages API. The system prompt is a dedicated request field.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl AnthropicClient {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL, 60.0)
    }

    pub fn with_model(
        api_key: &str,
        model: &str,
        requests_per_minute: f64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            http: super::http_client()?,
            rate_limiter: RateLimiter::new(requests_per_minute),
        })
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<CompletionResult> {
        let response = self
            .http
            .post(BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::new("claude", None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::new("claude", Some(status.as_u16()), body).into());
        }

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new("claude", None, e.to_string()))?;

        let text = data
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| ProviderError::new("claude", None, "empty content"))?;

        Ok(CompletionResult {
            text,
            provider: "claude".into(),
            model: self.model.clone(),
            prompt_tokens: data.usage.as_ref().and_then(|u| u.input_tokens),
            completion_tokens: data.usage.as_ref().and_then(|u| u.output_tokens),
            latency_ms: None,
        })
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn provider_name(&self) -> &'static str {
        "claude"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    async fn call_api(
        &self,
        prompt: &str,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        self.post(serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": opts.max_tokens,
            "temperature": opts.temperature,
        }))
        .await
    }

    async fn call_api_messages(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        let mut payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": opts.max_tokens,
            "temperature": opts.temperature,
        });
        if let Some(system) = system {
            payload["system"] = serde_json::Value::String(system.to_string());
        }
        self.post(payload).await
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}
