/*
[INPUT]:  Key presses from the input thread
[OUTPUT]: Page actions (quit, crosshair movement)
[POS]:    TUI key handling
[UPDATE]: When adding keybindings (keep the footer in ui.rs in sync)
*/

use crossterm::event::KeyCode;
use kline_feed::FeedSource;

use crate::chart::TerminalChart;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyAction {
    Quit,
    CrosshairLeft,
    CrosshairRight,
    ClearCrosshair,
    Ignore,
}

pub(super) fn key_action(code: KeyCode) -> KeyAction {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Left | KeyCode::Char('h') => KeyAction::CrosshairLeft,
        KeyCode::Right | KeyCode::Char('l') => KeyAction::CrosshairRight,
        KeyCode::Char('c') => KeyAction::ClearCrosshair,
        _ => KeyAction::Ignore,
    }
}

/// Apply a key press to the page; returns true when the user asked to quit
pub(super) fn handle_key_event<F: FeedSource>(
    page: &mut Page<'_, F, TerminalChart>,
    code: KeyCode,
) -> bool {
    let action = key_action(code);
    if action == KeyAction::Quit {
        return true;
    }
    let Some(chart) = page.chart_mut().surface_mut() else {
        return false;
    };
    match action {
        KeyAction::CrosshairLeft => chart.move_crosshair(-1),
        KeyAction::CrosshairRight => chart.move_crosshair(1),
        KeyAction::ClearCrosshair => chart.clear_crosshair(),
        KeyAction::Quit | KeyAction::Ignore => {}
    }
    false
}
