/*
[INPUT]:  Injected feed, chart options, shutdown token
[OUTPUT]: Page driven without a terminal; each redraw is logged
[POS]:    Headless runtime for servers and scripted runs
[UPDATE]: When changing what a headless run reports
*/

use anyhow::Result;
use kline_feed::{FeedEvent, FeedSource};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chart::{ChartOptions, TerminalChart};
use crate::page::Page;
use crate::window::WindowEvents;

const HEADLESS_WIDTH: u16 = 120;

/// Run the page until `shutdown` fires or the feed goes away
pub async fn run_headless<F: FeedSource>(
    feed: &F,
    chart: &ChartOptions,
    shutdown: CancellationToken,
) -> Result<()> {
    let window = WindowEvents::new();
    let mut page = Page::mount(
        feed,
        &window,
        TerminalChart::new(chart.clone(), HEADLESS_WIDTH),
    );
    info!("headless page mounted");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("shutdown requested");
                break;
            }
            maybe_event = page.next_feed_event() => {
                let Some(event) = maybe_event else {
                    info!("feed event stream ended");
                    break;
                };
                let is_data = matches!(event, FeedEvent::Data(_));
                page.handle_feed_event(event);
                if is_data {
                    log_chart_summary(&page);
                }
            }
        }
    }

    page.unmount();
    info!("headless page unmounted");
    Ok(())
}

fn log_chart_summary<F: FeedSource>(page: &Page<'_, F, TerminalChart>) {
    let Some(chart) = page.chart().surface() else {
        return;
    };
    match chart.last_point() {
        Some(last) => info!(
            candles = page.candles().len(),
            points = chart.series().len(),
            last_time = last.time,
            last_price = %chart.options().series.price_format.format(last.value),
            "chart updated"
        ),
        None => debug!(candles = page.candles().len(), "no drawable candles yet"),
    }
}
