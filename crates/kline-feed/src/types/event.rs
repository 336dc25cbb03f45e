/*
[INPUT]:  Decoded Socket.IO packets and transport lifecycle
[OUTPUT]: FeedEvent values delivered to subscribers
[POS]:    Data layer - event model between client and page
[UPDATE]: When adding lifecycle events or disconnect reasons
*/

use std::fmt;
use std::sync::Arc;

use crate::error::FeedError;

use super::candle::CandleRecord;

/// Events delivered to feed subscribers
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Namespace connect acknowledged by the server
    Connect,
    /// A connection attempt failed
    ConnectError(Arc<FeedError>),
    /// An established connection ended
    Disconnect(DisconnectReason),
    /// A full candle batch; replaces whatever was shown before
    Data(Vec<CandleRecord>),
}

impl FeedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FeedEvent::Connect => "connect",
            FeedEvent::ConnectError(_) => "connect_error",
            FeedEvent::Disconnect(_) => "disconnect",
            FeedEvent::Data(_) => "data",
        }
    }
}

/// Why a connected session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server sent a Socket.IO DISCONNECT; no reconnect follows
    IoServerDisconnect,
    /// Local `close()`
    IoClientDisconnect,
    /// Transport closed cleanly (Engine.IO close or socket EOF)
    TransportClose,
    /// Transport failed with an error
    TransportError,
    /// No heartbeat within `pingInterval + pingTimeout`
    PingTimeout,
}

impl DisconnectReason {
    /// Whether the client should try to reconnect after this reason
    pub fn should_reconnect(self) -> bool {
        !matches!(
            self,
            DisconnectReason::IoServerDisconnect | DisconnectReason::IoClientDisconnect
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisconnectReason::IoServerDisconnect => "io server disconnect",
            DisconnectReason::IoClientDisconnect => "io client disconnect",
            DisconnectReason::TransportClose => "transport close",
            DisconnectReason::TransportError => "transport error",
            DisconnectReason::PingTimeout => "ping timeout",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
