//! Client configuration.
//!
//! Read from environment variables:
//! - `FLUIR_SERVER_URL`: edit service base URL (default: "http://127.0.0.1:8001")
//! - `FLUIR_TIMEOUT_SECS`: per-request timeout in seconds (default: "10")

use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unparseable
    /// timeouts fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let server_url = lookup("FLUIR_SERVER_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let timeout_secs = lookup("FLUIR_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        ClientConfig {
            server_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of a `/api/module/<action>` endpoint.
    pub fn endpoint(&self, action: &str) -> String {
        format!("{}/api/module/{}", self.server_url.trim_end_matches('/'), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn reads_variables() {
        let config = ClientConfig::from_lookup(|key| match key {
            "FLUIR_SERVER_URL" => Some("http://edit.local:9000/".to_string()),
            "FLUIR_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        });
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.endpoint("edit"), "http://edit.local:9000/api/module/edit");
    }

    #[test]
    fn bad_timeout_falls_back() {
        let config = ClientConfig::from_lookup(|key| {
            (key == "FLUIR_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
