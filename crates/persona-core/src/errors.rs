use std::fmt;

/// Unknown provider/instrument/input-system key or missing credential.
/// Fatal: the job is failed without retry.
#[derive(Debug, Clone)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Non-success HTTP status, empty/blocked generation, or network failure
/// from a vendor API. Retryable until attempts are exhausted.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: String,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} API error {}: {}", self.provider, code, self.message),
            None => write!(f, "{} error: {}", self.provider, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Configuration errors are the only fatal class; everything else that
/// escapes a test case execution is treated as transient.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ConfigError>().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal() {
        let err = anyhow::Error::new(ConfigError("unknown provider: zork".into()));
        assert!(!is_retryable(&err));
    }

    #[test]
    fn provider_errors_are_retryable() {
        let err = anyhow::Error::new(ProviderError::new("gemini", Some(429), "rate limited"));
        assert!(is_retryable(&err));
        assert_eq!(err.to_string(), "gemini API error 429: rate limited");
    }

    #[test]
    fn wrapped_config_errors_stay_fatal() {
        let err = anyhow::Error::new(ConfigError("no API key for claude".into()))
            .context("resolving test case 12");
        assert!(!is_retryable(&err));
    }
}
