/*
[INPUT]:  Mounted page (status, chart), log buffer, page title
[OUTPUT]: Full-screen layout rendered into a ratatui frame
[POS]:    TUI rendering
[UPDATE]: When changing the layout, status colors, or hotkey footer
*/

use kline_feed::{ConnectionStatus, FeedSource};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::logs::{LogBufferHandle, lock_buffer};
use crate::chart::TerminalChart;
use crate::page::Page;

const LOG_PANEL_HEIGHT: u16 = 8;

pub(super) fn draw_ui<F: FeedSource>(
    frame: &mut Frame,
    page: &Page<'_, F, TerminalChart>,
    title: &str,
    log_buffer: &LogBufferHandle,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(LOG_PANEL_HEIGHT),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_title(frame, chunks[0], title);
    draw_status(frame, chunks[1], page);
    if let Some(chart) = page.chart().surface() {
        chart.render(frame, chunks[2]);
    }
    draw_logs(frame, chunks[3], log_buffer);
    draw_footer(frame, chunks[4]);
}

fn draw_title(frame: &mut Frame, area: Rect, title: &str) {
    let widget = Paragraph::new(Line::from(Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(widget, area);
}

pub(super) fn status_style(status: ConnectionStatus) -> Style {
    let color = match status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Error => Color::Red,
        ConnectionStatus::Disconnected => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn draw_status<F: FeedSource>(frame: &mut Frame, area: Rect, page: &Page<'_, F, TerminalChart>) {
    let status = page.status();
    let mut spans = vec![
        Span::raw("Status: "),
        Span::styled(status.label(), status_style(status)),
    ];
    if let Some(chart) = page.chart().surface() {
        spans.push(Span::raw(format!("   points: {}", chart.series().len())));
        if let Some(last) = chart.last_point() {
            let price = chart.options().series.price_format.format(last.value);
            spans.push(Span::raw(format!("   last: {price}")));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_logs(frame: &mut Frame, area: Rect, buffer: &LogBufferHandle) {
    let available = area.height.saturating_sub(2) as usize;
    let lines = lock_buffer(buffer).tail(available);
    let text = lines
        .into_iter()
        .map(|line| Line::from(Span::raw(line)))
        .collect::<Vec<_>>();
    let widget = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title("Logs"),
    );
    frame.render_widget(widget, area);
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let key_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::styled("[Left/Right]", key_style),
        Span::raw(" Crosshair  "),
        Span::styled("[c]", key_style),
        Span::raw(" Clear  "),
        Span::styled("[q/Esc]", key_style),
        Span::raw(" Quit"),
    ]);
    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title("Hotkeys"),
    );
    frame.render_widget(widget, area);
}

fn border_style() -> Style {
    Style::default().fg(Color::DarkGray)
}
