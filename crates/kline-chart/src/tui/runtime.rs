/*
[INPUT]:  Injected feed, app config, log buffer, shutdown token
[OUTPUT]: Ratatui run loop driving the page from ticks, input and feed events
[POS]:    TUI runtime loop
[UPDATE]: When changing the UI loop, input handling, or shutdown
*/

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, KeyEventKind};
use kline_feed::FeedSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::events::handle_key_event;
use super::logs::LogBufferHandle;
use super::terminal::TerminalGuard;
use super::ui::draw_ui;
use crate::chart::TerminalChart;
use crate::config::AppConfig;
use crate::page::Page;
use crate::window::{Resize, WindowEvents};

const UI_TICK_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);

enum UiEvent {
    Input(CrosstermEvent),
}

/// Run the chart page in the terminal until quit or `shutdown`.
///
/// The page is mounted on entry and unmounted on exit, which closes `feed`.
pub async fn run_tui_with_log<F: FeedSource>(
    feed: &F,
    config: &AppConfig,
    log_buffer: LogBufferHandle,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut terminal = TerminalGuard::new()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let input_shutdown = CancellationToken::new();
    let input_shutdown_clone = input_shutdown.clone();

    tokio::task::spawn_blocking(move || {
        while !input_shutdown_clone.is_cancelled() {
            if crossterm::event::poll(INPUT_POLL_INTERVAL).unwrap_or(false) {
                if let Ok(event) = crossterm::event::read() {
                    let _ = event_tx.send(UiEvent::Input(event));
                }
            }
        }
    });

    let size = terminal.size()?;
    let window = WindowEvents::new();
    let surface = TerminalChart::new(config.chart.clone(), size.width);
    let mut page = Page::mount(feed, &window, surface);
    info!(width = size.width, height = size.height, "chart page mounted");

    let mut tick = tokio::time::interval(UI_TICK_INTERVAL);
    let mut should_quit = false;

    while !should_quit {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("shutdown requested");
                should_quit = true;
            }
            _ = tick.tick() => {}
            maybe_feed_event = page.next_feed_event() => {
                if let Some(event) = maybe_feed_event {
                    page.handle_feed_event(event);
                }
            }
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(UiEvent::Input(CrosstermEvent::Key(key))) => {
                        if key.kind == KeyEventKind::Press && handle_key_event(&mut page, key.code) {
                            should_quit = true;
                        }
                    }
                    Some(UiEvent::Input(CrosstermEvent::Resize(width, height))) => {
                        window.emit(Resize::new(width, height));
                        page.chart_mut().sync_resize();
                    }
                    Some(_) => {}
                    None => should_quit = true,
                }
            }
        }

        if !should_quit {
            terminal.draw(|frame| draw_ui(frame, &page, &config.page.title, &log_buffer))?;
        }
    }

    input_shutdown.cancel();
    page.unmount();
    info!("chart page unmounted");
    Ok(())
}
