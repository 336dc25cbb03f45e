/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public kline feed crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mock;
pub mod protocol;
pub mod source;
pub mod transport;
pub mod types;

pub use client::FeedClient;
pub use config::FeedConfig;
pub use dispatch::{Dispatcher, Subscription};
pub use error::{FeedError, Result};
pub use mock::MockFeed;
pub use source::FeedSource;
pub use transport::TransportKind;

// Re-export all types
pub use types::*;
