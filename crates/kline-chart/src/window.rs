/*
[INPUT]:  Terminal resize notifications from the UI loop
[OUTPUT]: Resize event type and the dispatcher listeners subscribe to
[POS]:    Window layer - container size changes
[UPDATE]: When more window-level events are needed
*/

use kline_feed::Dispatcher;

/// New terminal size in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: u16,
    pub height: u16,
}

impl Resize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Resize listeners register here; dropping the subscription removes the listener
pub type WindowEvents = Dispatcher<Resize>;
