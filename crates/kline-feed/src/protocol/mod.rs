/*
[INPUT]:  Raw text frames / polling bodies from a Socket.IO server
[OUTPUT]: Engine.IO and Socket.IO packets (decode + encode)
[POS]:    Protocol layer - wire codec, no I/O
[UPDATE]: When supporting new packet types or protocol revisions
*/

pub mod engine;
pub mod socket;

pub use engine::{EnginePacket, Handshake, decode_payload, encode_payload};
pub use socket::{DEFAULT_NAMESPACE, SocketPacket};

/// Engine.IO protocol revision spoken by this client
pub const ENGINE_IO_VERSION: &str = "4";
