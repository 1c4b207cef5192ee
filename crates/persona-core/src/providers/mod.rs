use crate::errors::ConfigError;
use crate::model::{ChatMessage, CompletionResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai;

/// Token-interval gate shared by all calls through one client. One instance
/// per provider client, so rate limits are per-provider rather than global.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: f64) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(60.0 / requests_per_minute),
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    /// Wait until at least `60/rpm` seconds have passed since the last
    /// grant. Callers are serialized through the mutex so concurrent
    /// acquisitions never compute overlapping wait windows.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.3,
        }
    }
}

/// Uniform contract over one vendor's completion API.
///
/// Implementations provide the raw API calls; rate limiting and latency
/// measurement are handled here so every vendor behaves the same way.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn model_name(&self) -> &str;
    fn rate_limiter(&self) -> &RateLimiter;

    async fn call_api(
        &self,
        prompt: &str,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult>;

    async fn call_api_messages(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult>;

    /// Single-turn completion: acquire the rate limiter, make the call,
    /// stamp measured latency.
    async fn complete(
        &self,
        prompt: &str,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        self.rate_limiter().acquire().await;
        let start = Instant::now();
        let mut result = self.call_api(prompt, opts).await?;
        result.latency_ms = Some(start.elapsed().as_millis() as u64);
        Ok(result)
    }

    /// Multi-turn completion over an ordered list of prior turns. How the
    /// system prompt is carried (dedicated field, first message, separate
    /// instruction object) is private to each vendor.
    async fn complete_with_history(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        self.rate_limiter().acquire().await;
        let start = Instant::now();
        let mut result = self.call_api_messages(messages, system, opts).await?;
        result.latency_ms = Some(start.elapsed().as_millis() as u64);
        Ok(result)
    }

    /// Extract a single Likert rating from free text. A malformed response
    /// must not abort the job, only bias that one data point toward
    /// neutral.
    fn parse_rating(&self, text: &str) -> u8 {
        parse_rating(text)
    }
}

/// Exact numeric parse first, then a scan for the first in-range digit,
/// falling back to the neutral midpoint 3.
pub fn parse_rating(text: &str) -> u8 {
    let cleaned = text.trim().replace(['.', ','], "");

    if let Ok(score) = cleaned.parse::<i64>() {
        if (1..=5).contains(&score) {
            return score as u8;
        }
    }

    for ch in cleaned.chars() {
        if let Some(digit) = ch.to_digit(10) {
            if (1..=5).contains(&digit) {
                return digit as u8;
            }
        }
    }

    3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    OpenAi,
    DeepSeek,
    Gemini,
    Xai,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Xai => "xai",
            ProviderKind::Mock => "mock",
        }
    }

    pub fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::Claude,
            ProviderKind::OpenAi,
            ProviderKind::DeepSeek,
            ProviderKind::Gemini,
            ProviderKind::Xai,
            ProviderKind::Mock,
        ]
    }

    /// Whether this vendor needs an API credential at construction time.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Mock)
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "gemini" => Ok(ProviderKind::Gemini),
            "xai" => Ok(ProviderKind::Xai),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(ConfigError(format!("unknown provider: {other}"))),
        }
    }
}

/// Factory keyed by provider kind. A missing credential for a vendor that
/// needs one is a fatal configuration error.
pub fn create_client(
    kind: ProviderKind,
    api_key: Option<&str>,
) -> anyhow::Result<Arc<dyn ProviderClient>> {
    if kind.requires_api_key() && api_key.is_none() {
        return Err(ConfigError(format!("no API key for {}", kind.as_str())).into());
    }
    let key = api_key.unwrap_or_default();
    let client: Arc<dyn ProviderClient> = match kind {
        ProviderKind::Claude => Arc::new(anthropic::AnthropicClient::new(key)?),
        ProviderKind::OpenAi => Arc::new(openai::OpenAiCompatClient::openai(key)?),
        ProviderKind::DeepSeek => Arc::new(openai::OpenAiCompatClient::deepseek(key)?),
        ProviderKind::Gemini => Arc::new(gemini::GeminiClient::new(key)?),
        ProviderKind::Xai => Arc::new(openai::OpenAiCompatClient::xai(key)?),
        ProviderKind::Mock => Arc::new(mock::MockClient::default()),
    };
    Ok(client)
}

/// Shared reqwest client config for the HTTP-backed vendors. A network
/// timeout surfaces as a retryable provider error upstream.
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(Into::into)
}
