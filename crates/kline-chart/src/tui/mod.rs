/*
[INPUT]:  Feed, config, and log buffer from main
[OUTPUT]: Terminal UI entry point and log capture types
[POS]:    TUI module root
[UPDATE]: When adding TUI submodules
*/

mod events;
pub mod logs;
mod runtime;
mod terminal;
mod ui;

pub use logs::{LOG_BUFFER_CAPACITY, LogBuffer, LogBufferHandle, LogWriterFactory};
pub use runtime::run_tui_with_log;
