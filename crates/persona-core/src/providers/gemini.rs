use crate::errors::ProviderError;
use crate::model::{ChatMessage, CompletionResult, Role};
use crate::providers::{CompletionOptions, ProviderClient, RateLimiter};
use async_trait::async_trait;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini generateContent API. Roles are `user`/`model` and the
/// system prompt travels as a separate `systemInstruction` object.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL, 30.0)
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

    fn generation_config(opts: CompletionOptions) -> serde_json::Value {
        // Gemini counts internal reasoning toward the output cap, so a tiny
        // max_tokens starves the visible answer. Floor it at 1000.
        serde_json::json!({
            "temperature": opts.temperature,
            "maxOutputTokens": opts.max_tokens.max(1000),
            "topP": 0.95,
            "topK": 40,
        })
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<CompletionResult> {
        let url = format!("{}/{}:generateContent?key={}", BASE_URL, self.model, self.api_key);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::new("gemini", None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::new("gemini", Some(status.as_u16()), body).into());
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::new("gemini", None, e.to_string()))?;

        // Candidates can be absent or empty on safety-filtered output;
        // surface the finish reason instead of an opaque parse failure.
        let candidate = data
            .get("candidates")
            .and_then(|c| c.get(0))
            .ok_or_else(|| ProviderError::new("gemini", None, "no candidates"))?;

        let text = candidate
            .pointer("/content/parts/0/text")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                let reason = candidate
                    .get("finishReason")
                    .and_then(|r| r.as_str())
                    .unwrap_or("UNKNOWN");
                ProviderError::new("gemini", None, format!("no output, reason: {reason}"))
            })?;

        let usage = data.get("usageMetadata");
        Ok(CompletionResult {
            text,
            provider: "gemini".into(),
            model: self.model.clone(),
            prompt_tokens: usage
                .and_then(|u| u.get("promptTokenCount"))
                .and_then(|v| v.as_u64()),
            completion_tokens: usage
                .and_then(|u| u.get("candidatesTokenCount"))
                .and_then(|v| v.as_u64()),
            latency_ms: None,
        })
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn provider_name(&self) -> &'static str {
        "gemini"
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
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": Self::generation_config(opts),
        }))
        .await
    }

    async fn call_api_messages(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        let contents: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({"role": role, "parts": [{"text": msg.content}]})
            })
            .collect();

        let mut payload = serde_json::json!({
            "contents": contents,
            "generationConfig": Self::generation_config(opts),
        });
        if let Some(system) = system {
            payload["systemInstruction"] = serde_json::json!({"parts": [{"text": system}]});
        }
        self.post(payload).await
    }
}
