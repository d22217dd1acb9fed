//! Configuration for the reqwest client.

use std::time::Duration;

/// Default timeout for provider requests: 120 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the reqwest HTTP client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestConfig {
    /// Timeout for a whole request, including reading the response.
    pub timeout: Option<Duration>,
    /// User-Agent header to send with requests.
    pub user_agent: Option<String>,
}

impl ReqwestConfig {
    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("redraft/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective timeout, using the default if unset or zero.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Returns the effective user agent, using the default if unset or empty.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|agent| !agent.is_empty())
            .unwrap_or_else(Self::default_user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_uses_default() {
        let config = ReqwestConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.effective_timeout(), DEFAULT_TIMEOUT);

        let config = ReqwestConfig::default().with_timeout(Duration::from_secs(5));
        assert_eq!(config.effective_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn empty_user_agent_uses_default() {
        let config = ReqwestConfig::default().with_user_agent("");
        assert!(config.effective_user_agent().starts_with("redraft/"));
    }
}
