/*
[INPUT]:  Injected FeedSource, window resize events, a RenderSurface
[OUTPUT]: Connection status, latest candle array, mounted chart view
[POS]:    Page layer - owns page state and the feed subscription lifecycle
[UPDATE]: When the page reacts to new feed events or owns more state
*/

use kline_feed::{CandleRecord, ConnectionStatus, FeedEvent, FeedSource, Subscription};
use tracing::{debug, error, info};

use crate::chart::{ChartView, RenderSurface};
use crate::window::WindowEvents;

/// Page state between mount and unmount.
///
/// State is only touched from the owning loop, through `handle_feed_event`.
pub struct Page<'a, F: FeedSource, S: RenderSurface> {
    feed: &'a F,
    feed_events: Option<Subscription<FeedEvent>>,
    status: ConnectionStatus,
    candles: Vec<CandleRecord>,
    chart: ChartView<S>,
    mounted: bool,
}

impl<'a, F: FeedSource, S: RenderSurface> Page<'a, F, S> {
    /// Subscribe to the feed, mount the chart on `surface`, then connect.
    ///
    /// The subscription exists before the feed starts, so the first
    /// `Connect` and any early batch reach this page.
    pub fn mount(feed: &'a F, window: &WindowEvents, surface: S) -> Self {
        let feed_events = feed.subscribe();
        let chart = ChartView::mount(surface, window);
        feed.connect();
        debug!(subscription = feed_events.id(), "page mounted");
        Self {
            feed,
            feed_events: Some(feed_events),
            status: ConnectionStatus::Disconnected,
            candles: Vec::new(),
            chart,
            mounted: true,
        }
    }

    /// Wait for the next feed event. Never resolves once unmounted or after
    /// the feed went away.
    pub async fn next_feed_event(&mut self) -> Option<FeedEvent> {
        let Some(events) = self.feed_events.as_mut() else {
            return std::future::pending().await;
        };
        let event = events.recv().await;
        if event.is_none() {
            self.feed_events = None;
        }
        event
    }

    /// Handle every event already queued; returns how many were handled
    pub fn drain_feed_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.feed_events.as_mut().and_then(Subscription::try_recv) {
            self.handle_feed_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_feed_event(&mut self, event: FeedEvent) {
        if !self.mounted {
            return;
        }
        self.status = self.status.apply(&event);
        match event {
            FeedEvent::Connect => info!("connected to feed"),
            FeedEvent::ConnectError(err) => error!(error = %err, "feed connection error"),
            FeedEvent::Disconnect(reason) => info!(reason = %reason, "disconnected from feed"),
            FeedEvent::Data(candles) => {
                debug!(candles = candles.len(), "received kline data");
                self.candles = candles;
                self.chart.update(&self.candles);
            }
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Latest batch as received, before normalization
    pub fn candles(&self) -> &[CandleRecord] {
        &self.candles
    }

    pub fn chart(&self) -> &ChartView<S> {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut ChartView<S> {
        &mut self.chart
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Drop the feed subscription, close the feed and unmount the chart.
    /// Only the first call has an effect.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.feed_events = None;
        self.feed.close();
        self.chart.unmount();
        debug!("page unmounted");
    }
}

impl<F: FeedSource, S: RenderSurface> Drop for Page<'_, F, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
