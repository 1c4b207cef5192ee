use crate::errors::ProviderError;
use crate::model::{ChatMessage, CompletionResult, Role};
use crate::providers::{CompletionOptions, ProviderClient, RateLimiter};
use async_trait::async_trait;
use serde::Deserialize;

/// Chat-completions client for OpenAI and the OpenAI-compatible vendors
/// (DeepSeek, xAI). The system prompt is injected as the first message.
pub struct OpenAiCompatClient {
    provider: &'static str,
    base_url: &'static str,
    api_key: String,
    model: String,
    http: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl OpenAiCompatClient {
    pub fn openai(api_key: &str) -> anyhow::Result<Self> {
        Self::build(
            "openai",
            "https://api.openai.com/v1/chat/completions",
            api_key,
            "gpt-4o-mini",
            60.0,
        )
    }

    pub fn deepseek(api_key: &str) -> anyhow::Result<Self> {
        Self::build(
            "deepseek",
            "https://api.deepseek.com/v1/chat/completions",
            api_key,
            "deepseek-chat",
            60.0,
        )
    }

    pub fn xai(api_key: &str) -> anyhow::Result<Self> {
        Self::build(
            "xai",
            "https://api.x.ai/v1/chat/completions",
            api_key,
            "grok-3-mini",
            60.0,
        )
    }

    fn build(
        provider: &'static str,
        base_url: &'static str,
        api_key: &str,
        model: &str,
        requests_per_minute: f64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            provider,
            base_url,
            api_key: api_key.to_string(),
            model: model.to_string(),
            http: super::http_client()?,
            rate_limiter: RateLimiter::new(requests_per_minute),
        })
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<CompletionResult> {
        let response = self
            .http
            .post(self.base_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::new(self.provider, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(self.provider, Some(status.as_u16()), body).into());
        }

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(self.provider, None, e.to_string()))?;

        let text = data
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ProviderError::new(self.provider, None, "empty choices"))?;

        Ok(CompletionResult {
            text,
            provider: self.provider.into(),
            model: self.model.clone(),
            prompt_tokens: data.usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: data.usage.as_ref().and_then(|u| u.completion_tokens),
            latency_ms: None,
        })
    }

    fn wire_messages(
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Vec<serde_json::Value> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system {
            wire.push(serde_json::json!({"role": "system", "content": system}));
        }
        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            wire.push(serde_json::json!({"role": role, "content": msg.content}));
        }
        wire
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatClient {
    fn provider_name(&self) -> &'static str {
        self.provider
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
        self.post(serde_json::json!({
            "model": self.model,
            "messages": Self::wire_messages(messages, system),
            "max_tokens": opts.max_tokens,
            "temperature": opts.temperature,
        }))
        .await
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_becomes_first_message() {
        let history = vec![
            ChatMessage::user("Q1"),
            ChatMessage::assistant("4"),
            ChatMessage::user("Q2"),
        ];
        let wire = OpenAiCompatClient::wire_messages(&history, Some("be brief"));
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[2]["role"], "assistant");
        assert_eq!(wire[3]["content"], "Q2");
    }
}
