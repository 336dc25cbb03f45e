/*
[INPUT]:  Feed payload shapes and lifecycle semantics
[OUTPUT]: Typed candle records, feed events, connection status
[POS]:    Data layer - type definitions shared by client and consumers
[UPDATE]: When the feed payload or lifecycle events change
*/

pub mod candle;
pub mod event;
pub mod status;

pub use candle::*;
pub use event::*;
pub use status::*;
