//! Client configuration with builder pattern

use std::time::Duration;

/// Settings for [`super::TwingateClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Items requested per page when listing
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            page_size: 50,
            user_agent: format!("tg-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Page size, at least 1
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size.max(1);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
