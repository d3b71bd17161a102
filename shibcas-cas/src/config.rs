//! CAS client configuration.

use std::time::Duration;

/// Connection settings for the CAS server.
#[derive(Debug, Clone)]
pub struct CasClientConfig {
    /// CAS server URL prefix, e.g. `https://cas.example.edu/cas`
    pub server_url_prefix: String,
    /// Upper bound for one validation round-trip.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User agent sent to the CAS server.
    pub user_agent: String,
}

impl CasClientConfig {
    pub fn new(server_url_prefix: impl Into<String>) -> Self {
        Self {
            server_url_prefix: server_url_prefix.into(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("shibcas/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        if self.connect_timeout > timeout {
            self.connect_timeout = timeout;
        }
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CasClientConfig::new("https://cas.example.edu/cas");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("shibcas/"));
    }

    #[test]
    fn test_short_timeout_caps_connect_timeout() {
        let config = CasClientConfig::new("https://cas.example.edu/cas")
            .with_timeout(Duration::from_millis(500));
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
    }
}
