/*
[INPUT]:  Candle batches and resize events
[OUTPUT]: Chart view, rendering surface trait, and the terminal chart
[POS]:    Chart layer - module root
[UPDATE]: When adding chart components
*/

pub mod options;
pub mod surface;
pub mod terminal;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use options::{ChartOptions, CrosshairMode};
pub use surface::RenderSurface;
pub use terminal::{TerminalChart, TimeRange};
pub use view::ChartView;
