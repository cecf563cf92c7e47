//! Transport configuration for the provider HTTP client.

use std::collections::HashMap;
use std::time::Duration;

/// Transport configuration options.
///
/// Controls how requests are sent over the network. No timeout is applied unless
/// one is set explicitly.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Request timeout. If None, the reqwest default (none) is used.
    pub timeout: Option<Duration>,
    /// HTTP proxy URL.
    pub proxy: Option<String>,
    /// Additional HTTP headers to send with every request.
    pub headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_options_builder() {
        let options = TransportOptions::new()
            .with_timeout(Duration::from_secs(30))
            .with_proxy("http://proxy.example.com")
            .with_header("X-Custom-Header", "Value");

        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.proxy.as_deref(), Some("http://proxy.example.com"));
        let headers = options.headers.unwrap();
        assert_eq!(headers.get("X-Custom-Header"), Some(&"Value".to_string()));
    }

    #[test]
    fn test_transport_options_default_has_no_timeout() {
        let options = TransportOptions::default();
        assert!(options.timeout.is_none());
        assert!(options.proxy.is_none());
        assert!(options.headers.is_none());
    }
}
