/*
[INPUT]:  Latest candle batch from the page, resize events from the window
[OUTPUT]: Normalized series pushed into the mounted RenderSurface
[POS]:    Chart layer - view lifecycle (mount, update, resize, unmount)
[UPDATE]: When changing redraw rules or the mount lifecycle
*/

use kline_feed::{CandleRecord, Subscription};
use tracing::debug;

use super::RenderSurface;
use crate::normalize::{Normalized, normalize_candles};
use crate::window::{Resize, WindowEvents};

/// Owns one surface and one resize listener between mount and unmount
#[derive(Debug)]
pub struct ChartView<S: RenderSurface> {
    surface: Option<S>,
    resize: Option<Subscription<Resize>>,
}

impl<S: RenderSurface> ChartView<S> {
    /// Take ownership of a surface already sized to the container and start
    /// listening for resizes.
    pub fn mount(surface: S, window: &WindowEvents) -> Self {
        Self {
            surface: Some(surface),
            resize: Some(window.subscribe()),
        }
    }

    /// Replace the drawn series with `candles`.
    ///
    /// Returns `false` without touching the surface when the batch is empty,
    /// holds no usable record, or the view is unmounted.
    pub fn update(&mut self, candles: &[CandleRecord]) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if candles.is_empty() {
            return false;
        }

        let Normalized { points, skipped } = normalize_candles(candles);
        if skipped > 0 {
            debug!(
                skipped,
                total = candles.len(),
                "skipped malformed candle records"
            );
        }
        if points.is_empty() {
            return false;
        }

        surface.set_data(points);
        surface.fit_content();
        true
    }

    /// Apply the most recent pending resize, if any
    pub fn sync_resize(&mut self) -> bool {
        let Some(resize) = self.resize.as_mut() else {
            return false;
        };
        let mut latest = None;
        while let Some(event) = resize.try_recv() {
            latest = Some(event);
        }
        match (latest, self.surface.as_mut()) {
            (Some(event), Some(surface)) => {
                surface.apply_width(event.width);
                true
            }
            _ => false,
        }
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Drop the resize listener and hand back the surface for disposal.
    /// Calling it twice is a no-op.
    pub fn unmount(&mut self) -> Option<S> {
        self.resize = None;
        self.surface.take()
    }
}
