// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the query builder.
//!
//! Connection fields are opaque to the compiler and hydrator; they are handed
//! to whichever [`SearchTransport`](crate::transport::SearchTransport) the
//! caller wires in. The only value the core itself reads is `max_matches`,
//! the fallback for `OPTION max_matches` when a query sets none.
//!
//! # Example
//!
//! ```
//! use manticore_builder::ManticoreConfig;
//!
//! // Minimal config (uses defaults)
//! let config = ManticoreConfig::default();
//! assert_eq!(config.port, 9312);
//! assert_eq!(config.max_matches, Some(1000));
//!
//! // Full config
//! let config = ManticoreConfig {
//!     host: "search.internal".into(),
//!     max_matches: Some(20_000),
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Configuration snapshot passed to every builder at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct ManticoreConfig {
    /// Search daemon host
    #[serde(default = "default_host")]
    pub host: String,

    /// Search daemon port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Transport scheme understood by the caller's transport ("http", "https")
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Request timeout in seconds, enforced by the transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub persistent: bool,

    /// Default `max_matches` cap (None = emit no OPTION clause)
    #[serde(default = "default_max_matches")]
    pub max_matches: Option<u64>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9312 }
fn default_transport() -> String { "http".to_string() }
fn default_timeout_secs() -> u64 { 5 }
fn default_max_matches() -> Option<u64> { Some(1000) }

impl Default for ManticoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            transport: default_transport(),
            timeout_secs: default_timeout_secs(),
            persistent: false,
            max_matches: default_max_matches(),
        }
    }
}

impl ManticoreConfig {
    /// Build a config from `MANTICORE_*` environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults above.
    /// `MANTICORE_MAX_MATCHES=0` disables the default cap.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("MANTICORE_HOST").unwrap_or(defaults.host),
            port: lookup("MANTICORE_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            username: lookup("MANTICORE_USERNAME").filter(|v| !v.is_empty()),
            password: lookup("MANTICORE_PASSWORD").filter(|v| !v.is_empty()),
            transport: lookup("MANTICORE_TRANSPORT").unwrap_or(defaults.transport),
            timeout_secs: parsed("MANTICORE_TIMEOUT").unwrap_or(defaults.timeout_secs),
            persistent: lookup("MANTICORE_PERSISTENT")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.persistent),
            max_matches: match parsed("MANTICORE_MAX_MATCHES") {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.max_matches,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ManticoreConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.transport, "http");
        assert_eq!(config.timeout_secs, 5);
        assert!(!config.persistent);
        assert_eq!(config.max_matches, Some(1000));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ManticoreConfig =
            serde_json::from_str(r#"{"host": "10.0.0.5", "max_matches": 8000}"#).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 9312);
        assert_eq!(config.max_matches, Some(8000));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("MANTICORE_HOST", "search"),
            ("MANTICORE_PORT", "9308"),
            ("MANTICORE_PERSISTENT", "true"),
            ("MANTICORE_MAX_MATCHES", "5000"),
        ]
        .into_iter()
        .collect();

        let config = ManticoreConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.host, "search");
        assert_eq!(config.port, 9308);
        assert!(config.persistent);
        assert_eq!(config.max_matches, Some(5000));
        assert_eq!(config.username, None);
    }

    #[test]
    fn test_from_lookup_zero_max_matches_disables_cap() {
        let config = ManticoreConfig::from_lookup(|k| {
            (k == "MANTICORE_MAX_MATCHES").then(|| "0".to_string())
        });
        assert_eq!(config.max_matches, None);
    }
}
