/*
[INPUT]:  Engine.IO v4 text packets and polling payloads
[OUTPUT]: EnginePacket values and their wire encoding
[POS]:    Protocol layer - transport framing
[UPDATE]: When Engine.IO framing changes
*/

use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

/// Separates packets inside one polling payload
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Open packet body sent by the server right after the transport opens
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// How long the client may go without hearing from the server
    pub fn heartbeat_deadline_ms(&self) -> u64 {
        self.ping_interval.saturating_add(self.ping_timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| FeedError::Protocol("empty engine packet".to_string()))?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(body)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            'b' => Err(FeedError::Protocol(
                "base64 binary packets are not supported".to_string(),
            )),
            other => Err(FeedError::Protocol(format!(
                "unknown engine packet type: {other:?}"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                // Handshake only holds strings and integers.
                let body = serde_json::to_string(handshake).unwrap_or_default();
                format!("0{body}")
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

/// Split a polling response body into packets.
pub fn decode_payload(body: &str) -> Result<Vec<EnginePacket>> {
    body.split(RECORD_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(EnginePacket::decode)
        .collect()
}

/// Join packets into one polling request body.
pub fn encode_payload(packets: &[EnginePacket]) -> String {
    let mut out = String::new();
    for (idx, packet) in packets.iter().enumerate() {
        if idx > 0 {
            out.push(RECORD_SEPARATOR);
        }
        out.push_str(&packet.encode());
    }
    out
}
