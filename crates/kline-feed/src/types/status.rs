/*
[INPUT]:  Feed lifecycle events
[OUTPUT]: ConnectionStatus value and transition function
[POS]:    Data layer - connection status model
[UPDATE]: When lifecycle events are added or relabelled
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use super::event::FeedEvent;

/// Connection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    Error,
}

impl ConnectionStatus {
    /// Status after `event`. Data events leave it unchanged.
    pub fn apply(self, event: &FeedEvent) -> Self {
        match event {
            FeedEvent::Connect => ConnectionStatus::Connected,
            FeedEvent::ConnectError(_) => ConnectionStatus::Error,
            FeedEvent::Disconnect(_) => ConnectionStatus::Disconnected,
            FeedEvent::Data(_) => self,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::FeedError;
    use crate::types::DisconnectReason;

    #[test]
    fn status_follows_lifecycle_events() {
        let status = ConnectionStatus::default();
        assert_eq!(status, ConnectionStatus::Disconnected);

        let status = status.apply(&FeedEvent::Connect);
        assert_eq!(status, ConnectionStatus::Connected);

        let status = status.apply(&FeedEvent::Data(Vec::new()));
        assert_eq!(status, ConnectionStatus::Connected);

        let status = status.apply(&FeedEvent::Disconnect(DisconnectReason::TransportClose));
        assert_eq!(status, ConnectionStatus::Disconnected);

        let status = status.apply(&FeedEvent::ConnectError(Arc::new(FeedError::TransportClosed)));
        assert_eq!(status, ConnectionStatus::Error);
    }

    #[test]
    fn status_labels() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(ConnectionStatus::Error.to_string(), "error");
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "disconnected");
    }
}
