//! Environment-driven configuration.
//!
//! Environment variables:
//! - `REVISION_MAX_CHAIN_DEPTH`: cap on chain-walk steps (default: 10000)
//! - `HOST`: service host (default: 0.0.0.0)
//! - `PORT`: service port (default: 8002)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)

use crate::resolver::DEFAULT_MAX_CHAIN_DEPTH;

/// Configuration of the revision browser core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Maximum number of steps a single chain walk may take.
    pub max_chain_depth: usize,
}

impl BrowserConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            max_chain_depth: lookup("REVISION_MAX_CHAIN_DEPTH")
                .and_then(|s| s.parse().ok())
                .filter(|depth: &usize| *depth > 0)
                .unwrap_or(DEFAULT_MAX_CHAIN_DEPTH),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }
}

/// Log output format of the service binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human readable output for local development.
    Pretty,
}

/// Configuration of the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
    /// Core configuration.
    pub browser: BrowserConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };
        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(8002),
            log_format,
            browser: BrowserConfig::from_lookup(&lookup),
        }
    }

    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind_address(), "0.0.0.0:8002");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.browser, BrowserConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("LOG_FORMAT", "pretty"),
            ("REVISION_MAX_CHAIN_DEPTH", "64"),
        ]));
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.browser.max_chain_depth, 64);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("REVISION_MAX_CHAIN_DEPTH", "0"),
        ]));
        assert_eq!(config.port, 8002);
        assert_eq!(config.browser.max_chain_depth, DEFAULT_MAX_CHAIN_DEPTH);
    }
}
