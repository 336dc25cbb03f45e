/*
[INPUT]:  kline-feed events, YAML/env configuration, terminal input
[OUTPUT]: Live kline chart page (terminal and headless)
[POS]:    Library root - re-exports for the binary and tests
[UPDATE]: When adding top-level modules
*/

pub mod chart;
pub mod config;
pub mod headless;
pub mod normalize;
pub mod page;
pub mod tui;
pub mod window;

pub use chart::{ChartOptions, ChartView, RenderSurface, TerminalChart};
pub use config::AppConfig;
pub use normalize::{ChartPoint, Normalized, normalize_candles};
pub use page::Page;
pub use window::{Resize, WindowEvents};
