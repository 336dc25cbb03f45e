/*
[INPUT]:  Error sources (HTTP polling, WebSocket, serialization, protocol, config)
[OUTPUT]: Structured error types with retry hints
[POS]:    Error handling layer - unified error types for the feed crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the kline feed client
#[derive(Error, Debug)]
pub enum FeedError {
    /// HTTP request failed (polling transport)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket transport failed
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Server sent something that is not valid Engine.IO / Socket.IO
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server answered the namespace connect with CONNECT_ERROR
    #[error("Connection rejected by server: {message}")]
    ConnectRejected { message: String },

    /// Handshake or heartbeat took too long
    #[error("Timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport task ended while a packet was in flight
    #[error("Transport closed")]
    TransportClosed,

    /// Every configured transport failed to open
    #[error("No transport could connect (tried: {tried})")]
    NoTransport { tried: String },
}

impl FeedError {
    /// Whether another connection attempt can succeed. The reconnect loop
    /// stops on the first error that is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FeedError::Http(_)
                | FeedError::WebSocket(_)
                | FeedError::Timeout { .. }
                | FeedError::TransportClosed
                | FeedError::NoTransport { .. }
                | FeedError::ConnectRejected { .. }
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::WebSocket(err.to_string())
    }
}

/// Result type alias for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let timeout_err = FeedError::Timeout { duration_ms: 20_000 };
        assert!(timeout_err.is_retryable());

        let config_err = FeedError::Config("missing url".to_string());
        assert!(!config_err.is_retryable());

        let protocol_err = FeedError::Protocol("bad packet".to_string());
        assert!(!protocol_err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = FeedError::ConnectRejected {
            message: "Not authorized".to_string(),
        };
        assert_eq!(err.to_string(), "Connection rejected by server: Not authorized");

        let err = FeedError::NoTransport {
            tried: "websocket, polling".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No transport could connect (tried: websocket, polling)"
        );
    }
}
