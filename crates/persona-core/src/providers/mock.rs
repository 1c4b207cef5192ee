use crate::model::{ChatMessage, CompletionResult};
use crate::providers::{CompletionOptions, ProviderClient, RateLimiter};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-process client with scripted replies. Used by tests and `quick-test`;
/// also reachable as provider "mock" so a whole experiment can run without
/// network access.
pub struct MockClient {
    replies: Mutex<Vec<String>>,
    next: Mutex<usize>,
    /// Message histories received by `call_api_messages`, in call order.
    pub histories: Mutex<Vec<Vec<ChatMessage>>>,
    /// System prompts received by `call_api_messages`, in call order.
    pub systems: Mutex<Vec<Option<String>>>,
    /// Prompts received by `call_api`, in call order.
    pub prompts: Mutex<Vec<String>>,
    rate_limiter: RateLimiter,
}

impl MockClient {
    pub fn scripted(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            next: Mutex::new(0),
            histories: Mutex::new(Vec::new()),
            systems: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            // effectively unthrottled
            rate_limiter: RateLimiter::new(600_000.0),
        }
    }

    fn next_reply(&self) -> String {
        let replies = self.replies.lock().unwrap();
        let mut next = self.next.lock().unwrap();
        let reply = replies.get(*next).cloned().unwrap_or_else(|| "3".to_string());
        *next += 1;
        reply
    }

    fn result_for(&self, text: String, context_estimate: u64) -> CompletionResult {
        CompletionResult {
            text,
            provider: "mock".into(),
            model: "mock-1".into(),
            prompt_tokens: Some(context_estimate),
            completion_tokens: Some(1),
            latency_ms: None,
        }
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::scripted(Vec::new())
    }
}

#[async_trait]
impl ProviderClient for MockClient {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-1"
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    async fn call_api(
        &self,
        prompt: &str,
        _opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let estimate = (prompt.len() / 4) as u64;
        Ok(self.result_for(self.next_reply(), estimate))
    }

    async fn call_api_messages(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
        _opts: CompletionOptions,
    ) -> anyhow::Result<CompletionResult> {
        self.histories.lock().unwrap().push(messages.to_vec());
        self.systems
            .lock()
            .unwrap()
            .push(system.map(str::to_string));
        let estimate: u64 = messages.iter().map(|m| (m.content.len() / 4) as u64).sum();
        Ok(self.result_for(self.next_reply(), estimate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_then_neutral_default() {
        let client = MockClient::scripted(vec!["4", "x"]);
        let opts = CompletionOptions::default();
        assert_eq!(client.complete("a", opts).await.unwrap().text, "4");
        assert_eq!(client.complete("b", opts).await.unwrap().text, "x");
        assert_eq!(client.complete("c", opts).await.unwrap().text, "3");
    }

    #[tokio::test]
    async fn latency_is_stamped_by_provided_methods() {
        let client = MockClient::default();
        let result = client.complete("hi", CompletionOptions::default()).await.unwrap();
        assert!(result.latency_ms.is_some());
    }
}
