/*
[INPUT]:  Test-driven feed events
[OUTPUT]: MockFeed implementing FeedSource without any network
[POS]:    Test support - substitute feed for consumers
[UPDATE]: When FeedSource changes
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dispatch::{Dispatcher, Subscription};
use crate::error::FeedError;
use crate::source::FeedSource;
use crate::types::{CandleRecord, DisconnectReason, FeedEvent};

/// In-memory feed for tests: emit events by hand, count connect and close calls.
#[derive(Debug, Default)]
pub struct MockFeed {
    events: Dispatcher<FeedEvent>,
    connect_calls: AtomicUsize,
    subscribers_on_connect: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event; returns how many subscribers received it.
    pub fn emit(&self, event: FeedEvent) -> usize {
        self.events.emit(event)
    }

    pub fn emit_connect(&self) -> usize {
        self.emit(FeedEvent::Connect)
    }

    pub fn emit_connect_error(&self, message: &str) -> usize {
        self.emit(FeedEvent::ConnectError(Arc::new(FeedError::WebSocket(
            message.to_string(),
        ))))
    }

    pub fn emit_disconnect(&self) -> usize {
        self.emit(FeedEvent::Disconnect(DisconnectReason::TransportClose))
    }

    pub fn emit_data(&self, candles: Vec<CandleRecord>) -> usize {
        self.emit(FeedEvent::Data(candles))
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    pub fn connect_count(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Subscriber count seen by the most recent `connect`
    pub fn subscribers_on_connect(&self) -> usize {
        self.subscribers_on_connect.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl FeedSource for MockFeed {
    fn subscribe(&self) -> Subscription<FeedEvent> {
        self.events.subscribe()
    }

    fn connect(&self) {
        self.subscribers_on_connect
            .store(self.subscriber_count(), Ordering::SeqCst);
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
