/*
[INPUT]:  Feed address, transport order, reconnect policy
[OUTPUT]: FeedConfig consumed by FeedClient
[POS]:    Configuration layer - connection setup
[UPDATE]: When adding connection options
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FeedError, Result};
use crate::transport::TransportKind;

const DEFAULT_URL: &str = "http://localhost:5000";
const DEFAULT_PATH: &str = "/socket.io/";
const DEFAULT_EVENT: &str = "kline_data";

/// Connection settings for the candle feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Server base address (http/https; ws/wss are accepted too)
    #[serde(default = "default_url")]
    pub url: String,
    /// Engine.IO mount path on the server
    #[serde(default = "default_path")]
    pub path: String,
    /// Socket.IO event carrying candle batches
    #[serde(default = "default_event")]
    pub event: String,
    /// Transports tried in order on every connection attempt
    #[serde(default = "default_transports")]
    pub transports: Vec<TransportKind>,
    /// Reconnect after failures and transport drops
    #[serde(default = "default_true")]
    pub reconnection: bool,
    /// Retries after the initial attempt before giving up
    #[serde(default = "default_reconnection_attempts")]
    pub reconnection_attempts: u32,
    /// Fixed delay between attempts
    #[serde(default = "default_reconnection_delay_ms")]
    pub reconnection_delay_ms: u64,
    /// Keep and resend session cookies
    #[serde(default = "default_true")]
    pub with_credentials: bool,
    /// Bound on transport open + namespace connect
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            path: default_path(),
            event: default_event(),
            transports: default_transports(),
            reconnection: true,
            reconnection_attempts: default_reconnection_attempts(),
            reconnection_delay_ms: default_reconnection_delay_ms(),
            with_credentials: true,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl FeedConfig {
    /// Config pointing at `url` with every other field defaulted
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn reconnection_delay(&self) -> Duration {
        Duration::from_millis(self.reconnection_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Parse and check the configuration before any connection is made
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.url)?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => {}
            other => {
                return Err(FeedError::Config(format!("unsupported url scheme: {other}")));
            }
        }
        if self.transports.is_empty() {
            return Err(FeedError::Config("at least one transport is required".to_string()));
        }
        if self.event.trim().is_empty() {
            return Err(FeedError::Config("event name must not be empty".to_string()));
        }
        if !self.path.starts_with('/') {
            return Err(FeedError::Config(format!(
                "path must start with '/': {}",
                self.path
            )));
        }
        Ok(url)
    }
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_event() -> String {
    DEFAULT_EVENT.to_string()
}

fn default_transports() -> Vec<TransportKind> {
    vec![TransportKind::Websocket, TransportKind::Polling]
}

fn default_true() -> bool {
    true
}

fn default_reconnection_attempts() -> u32 {
    5
}

fn default_reconnection_delay_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    20_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_feed_contract() {
        let config = FeedConfig::default();
        assert_eq!(config.url, "http://localhost:5000");
        assert_eq!(config.event, "kline_data");
        assert_eq!(
            config.transports,
            vec![TransportKind::Websocket, TransportKind::Polling]
        );
        assert!(config.reconnection);
        assert_eq!(config.reconnection_attempts, 5);
        assert_eq!(config.reconnection_delay(), Duration::from_millis(1000));
        assert!(config.with_credentials);
    }

    #[test]
    fn validate_rejects_bad_input() {
        let mut config = FeedConfig::with_url("ftp://example.com");
        assert!(matches!(config.validate(), Err(FeedError::Config(_))));

        config.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(FeedError::UrlParse(_))));

        config.url = "http://127.0.0.1:5000".to_string();
        config.transports.clear();
        assert!(matches!(config.validate(), Err(FeedError::Config(_))));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: FeedConfig =
            serde_json::from_str(r#"{"url":"http://10.0.0.2:5000","transports":["polling"]}"#)
                .unwrap();
        assert_eq!(config.url, "http://10.0.0.2:5000");
        assert_eq!(config.transports, vec![TransportKind::Polling]);
        assert_eq!(config.reconnection_attempts, 5);
        assert_eq!(config.path, "/socket.io/");
    }
}
